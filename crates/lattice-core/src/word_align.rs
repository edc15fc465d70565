//! Word alignment extraction from a linear compact lattice.

use tracing::warn;

use crate::fst::{CompactLattice, Label};
use crate::semiring::Semiring;

/// Per-word timing decoded from a linear lattice. The three vectors always
/// have equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordAlignment {
    pub words: Vec<Label>,
    pub begin_times: Vec<i32>,
    pub lengths: Vec<i32>,
}

/// Walk a linear compact lattice from the start, emitting one
/// `(word, begin, length)` triple per arc; an arc's length is its
/// frame-string length. Epsilon words are emitted like any other.
///
/// Returns `None` (with a warning) if the lattice is empty or not linear:
/// a state that is final must have no arcs, and every other state must have
/// exactly one. A non-empty string on the final weight only warns; such a
/// lattice was probably not word-aligned and the output is approximate.
pub fn compact_lattice_to_word_alignment(clat: &CompactLattice) -> Option<WordAlignment> {
    let Some(mut state) = clat.start() else {
        warn!("empty lattice");
        return None;
    };
    let mut alignment = WordAlignment::default();
    let mut cur_time = 0i32;
    loop {
        let final_weight = clat.final_weight(state);
        let num_arcs = clat.num_arcs(state);
        if !final_weight.is_zero() {
            if num_arcs != 0 {
                warn!(num_arcs, "lattice is not linear");
                return None;
            }
            if !final_weight.string.is_empty() {
                warn!(
                    "lattice has alignments on the final weight: probably was \
                     not word-aligned (alignments will be approximate)"
                );
            }
            return Some(alignment);
        }
        if num_arcs != 1 {
            warn!(num_arcs, "lattice is not linear");
            return None;
        }
        let arc = &clat.arcs(state)[0];
        let length = arc.weight.string.len() as i32;
        // Acceptor, so ilabel == olabel; a zero word id is emitted anyway.
        alignment.words.push(arc.ilabel);
        alignment.begin_times.push(cur_time);
        alignment.lengths.push(length);
        cur_time += length;
        state = arc.nextstate;
    }
}
