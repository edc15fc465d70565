//! State-time labeling: map every state to the frame index at which it is
//! entered. Times are `i32` with `-1` meaning "not reached"; non-accessible
//! states keep `-1` and callers that bucket by time skip them.

use tracing::warn;

use crate::fst::{CompactLattice, Lattice, EPSILON};
use crate::semiring::Semiring;

/// Frame index of each state of an arc-labeled lattice, and the utterance
/// length (the maximum time).
///
/// Each non-epsilon input label consumes one frame; epsilon arcs stay on the
/// same frame. Every path into a state must agree on its time; disagreement
/// is a caller bug and panics. The lattice must be topologically sorted with
/// start state 0.
pub fn lattice_state_times(lat: &Lattice) -> (i32, Vec<i32>) {
    assert!(
        lat.is_top_sorted(),
        "input lattice must be topologically sorted"
    );
    assert_eq!(lat.start(), Some(0));
    let num_states = lat.num_states();
    let mut times = vec![-1i32; num_states];
    times[0] = 0;
    for state in 0..num_states {
        let cur_time = times[state];
        for arc in lat.arcs(state as u32) {
            let next = arc.nextstate as usize;
            let next_time = if arc.ilabel != EPSILON {
                cur_time + 1
            } else {
                cur_time
            };
            if times[next] == -1 {
                times[next] = next_time;
            } else {
                assert_eq!(
                    times[next], next_time,
                    "lattice paths disagree on the time of state {next}"
                );
            }
        }
    }
    let utt_len = times.iter().copied().max().unwrap_or(0);
    (utt_len, times)
}

/// Frame index of each state of a compact lattice, and the utterance length.
///
/// An arc advances time by its frame-string length. State times must agree
/// exactly (panic otherwise); final states whose accumulated lengths
/// disagree only produce a warning, and the maximum is adopted. A lattice
/// with no final state warns and reports length 0.
pub fn compact_lattice_state_times(clat: &CompactLattice) -> (i32, Vec<i32>) {
    assert!(
        clat.is_top_sorted(),
        "input lattice must be topologically sorted"
    );
    assert_eq!(clat.start(), Some(0));
    let num_states = clat.num_states();
    let mut times = vec![-1i32; num_states];
    times[0] = 0;
    let mut utt_len = -1i32;
    for state in 0..num_states {
        let cur_time = times[state];
        for arc in clat.arcs(state as u32) {
            let next = arc.nextstate as usize;
            let next_time = cur_time + arc.weight.string.len() as i32;
            if times[next] == -1 {
                times[next] = next_time;
            } else {
                assert_eq!(
                    times[next], next_time,
                    "compact lattice paths disagree on the time of state {next}"
                );
            }
        }
        let final_weight = clat.final_weight(state as u32);
        if !final_weight.is_zero() {
            let this_utt_len = times[state] + final_weight.string.len() as i32;
            if utt_len == -1 {
                utt_len = this_utt_len;
            } else if this_utt_len != utt_len {
                warn!("utterance does not seem to have a consistent length");
                utt_len = utt_len.max(this_utt_len);
            }
        }
    }
    if utt_len == -1 {
        warn!("utterance does not have a final state");
        return (0, times);
    }
    (utt_len, times)
}
