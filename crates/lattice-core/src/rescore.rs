//! In-place cost rewrites: word-insertion penalties and acoustic rescoring
//! against an external per-frame likelihood oracle.

use tracing::warn;

use crate::fst::{CompactLattice, Label, Lattice, StateId, EPSILON};
use crate::times::lattice_state_times;

/// Add `word_ins_penalty` to the graph component of every word-bearing arc.
pub fn add_word_ins_pen_to_lattice(word_ins_penalty: f32, lat: &mut Lattice) {
    for state in 0..lat.num_states() {
        for arc in lat.arcs_mut(state as StateId) {
            if arc.ilabel != EPSILON {
                arc.weight.value1 += word_ins_penalty;
            }
        }
    }
}

/// Compact-lattice variant; the penalty lands on the inner weight's graph
/// component, the frame string is untouched.
pub fn add_word_ins_pen_to_compact_lattice(word_ins_penalty: f32, clat: &mut CompactLattice) {
    for state in 0..clat.num_states() {
        for arc in clat.arcs_mut(state as StateId) {
            if arc.ilabel != EPSILON {
                arc.weight.weight.value1 += word_ins_penalty;
            }
        }
    }
}

/// Frame-indexed likelihood oracle, typically backed by an acoustic model.
pub trait Decodable {
    fn log_likelihood(&self, frame: i32, token: Label) -> f32;
    fn is_last_frame(&self, frame: i32) -> bool;
}

/// Replace the acoustic component of every word-bearing arc with the
/// oracle's likelihood for that arc's frame: `value2 -= log_likelihood`.
///
/// Graph costs and topology are untouched. Returns `false` (with a warning)
/// on an empty lattice, a cyclic lattice, or an oracle that runs out of
/// frames before the lattice does; in the last case the lattice may already
/// be partially rewritten.
pub fn rescore_lattice(decodable: &dyn Decodable, lat: &mut Lattice) -> bool {
    if lat.num_states() == 0 {
        warn!("rescoring empty lattice");
        return false;
    }
    if !lat.is_top_sorted() && lat.top_sort().is_err() {
        warn!("cycles detected in lattice");
        return false;
    }
    let (utt_len, state_times) = lattice_state_times(lat);

    let mut time_to_state: Vec<Vec<StateId>> = vec![Vec::new(); utt_len as usize];
    let num_states = lat.num_states();
    assert_eq!(num_states, state_times.len());
    for state in 0..num_states {
        let t = state_times[state];
        // Non-accessible states can sit at time -1; skip them.
        assert!(t <= utt_len);
        if t >= 0 && t < utt_len {
            time_to_state[t as usize].push(state as StateId);
        }
    }

    for t in 0..utt_len {
        if t < utt_len - 1 && decodable.is_last_frame(t) {
            warn!(utt_len, last_frame = t, "features are too short for lattice");
            return false;
        }
        for &state in &time_to_state[t as usize] {
            for arc in lat.arcs_mut(state) {
                if arc.ilabel != EPSILON {
                    // The token is whatever id the oracle expects, normally
                    // a transition id.
                    let log_like = decodable.log_likelihood(t, arc.ilabel);
                    arc.weight.value2 -= log_like;
                }
            }
        }
    }
    true
}
