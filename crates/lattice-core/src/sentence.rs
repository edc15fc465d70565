//! Longest sentence length: DAG longest path counting word-bearing arcs.

use crate::fst::{CompactLattice, Lattice, StateId, EPSILON};
use crate::semiring::Semiring;

/// Maximum number of word-bearing arcs (`olabel != 0`) on any start-to-final
/// path of an arc-labeled lattice. Unsorted input is copied and sorted
/// (cycles panic); a cycle carrying a word would make the length unbounded
/// and is asserted against.
pub fn longest_sentence_length_lattice(lat: &Lattice) -> i32 {
    if !lat.is_top_sorted() {
        let mut lat_copy = lat.clone();
        lat_copy
            .top_sort()
            .expect("unable to topologically sort lattice (cycles found?)");
        return longest_sentence_length_lattice(&lat_copy);
    }
    let num_states = lat.num_states();
    let mut max_length = vec![0i32; num_states];
    let mut lattice_max_length = 0i32;
    for s in 0..num_states {
        let this_max_length = max_length[s];
        for arc in lat.arcs(s as StateId) {
            let arc_has_word = arc.olabel != EPSILON;
            let nextstate = arc.nextstate as usize;
            assert!(nextstate < num_states);
            if arc_has_word {
                assert!(nextstate > s, "lattice has cycles with words on");
                max_length[nextstate] = max_length[nextstate].max(this_max_length + 1);
            } else {
                max_length[nextstate] = max_length[nextstate].max(this_max_length);
            }
        }
        if !lat.final_weight(s as StateId).is_zero() {
            lattice_max_length = lattice_max_length.max(max_length[s]);
        }
    }
    lattice_max_length
}

/// Compact-lattice variant: counts `ilabel != 0` arcs (acceptor, so the
/// labels coincide; zeroed labels are still supported).
pub fn longest_sentence_length_compact_lattice(clat: &CompactLattice) -> i32 {
    if !clat.is_top_sorted() {
        let mut clat_copy = clat.clone();
        clat_copy
            .top_sort()
            .expect("unable to topologically sort lattice (cycles found?)");
        return longest_sentence_length_compact_lattice(&clat_copy);
    }
    let num_states = clat.num_states();
    let mut max_length = vec![0i32; num_states];
    let mut lattice_max_length = 0i32;
    for s in 0..num_states {
        let this_max_length = max_length[s];
        for arc in clat.arcs(s as StateId) {
            let arc_has_word = arc.ilabel != EPSILON;
            let nextstate = arc.nextstate as usize;
            assert!(nextstate < num_states);
            assert!(nextstate > s, "compact lattice has cycles");
            if arc_has_word {
                max_length[nextstate] = max_length[nextstate].max(this_max_length + 1);
            } else {
                max_length[nextstate] = max_length[nextstate].max(this_max_length);
            }
        }
        if !clat.final_weight(s as StateId).is_zero() {
            lattice_max_length = lattice_max_length.max(max_length[s]);
        }
    }
    lattice_max_length
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::{Arc, Label};
    use crate::semiring::{CompactLatticeWeight, LatticeWeight};

    fn lw(a: f32, b: f32) -> LatticeWeight {
        LatticeWeight::new(a, b)
    }

    fn clw(s: &[Label]) -> CompactLatticeWeight {
        CompactLatticeWeight::new(LatticeWeight::new(0.0, 0.0), s.to_vec())
    }

    #[test]
    fn test_counts_longest_of_two_routes() {
        // 0 -> 1 -> 2 -> 4 has three words; 0 -> 3 -> 4 has two.
        let mut lat = Lattice::new();
        for _ in 0..5 {
            lat.add_state();
        }
        lat.set_start(0);
        lat.add_arc(0, Arc::new(1, 1, lw(0.0, 0.0), 1));
        lat.add_arc(1, Arc::new(2, 2, lw(0.0, 0.0), 2));
        lat.add_arc(2, Arc::new(3, 3, lw(0.0, 0.0), 4));
        lat.add_arc(0, Arc::new(4, 4, lw(0.0, 0.0), 3));
        lat.add_arc(3, Arc::new(5, 5, lw(0.0, 0.0), 4));
        lat.set_final(4, lw(0.0, 0.0));
        assert_eq!(longest_sentence_length_lattice(&lat), 3);
    }

    #[test]
    fn test_epsilon_output_does_not_count() {
        let mut lat = Lattice::new();
        for _ in 0..3 {
            lat.add_state();
        }
        lat.set_start(0);
        // Word on the input side only; output epsilon carries no word.
        lat.add_arc(0, Arc::new(7, EPSILON, lw(0.0, 0.0), 1));
        lat.add_arc(1, Arc::new(8, 8, lw(0.0, 0.0), 2));
        lat.set_final(2, lw(0.0, 0.0));
        assert_eq!(longest_sentence_length_lattice(&lat), 1);
    }

    #[test]
    fn test_intermediate_final_state() {
        // Final at state 1 after one word; longer continuation is not final.
        let mut lat = Lattice::new();
        for _ in 0..3 {
            lat.add_state();
        }
        lat.set_start(0);
        lat.add_arc(0, Arc::new(1, 1, lw(0.0, 0.0), 1));
        lat.add_arc(1, Arc::new(2, 2, lw(0.0, 0.0), 2));
        lat.set_final(1, lw(0.0, 0.0));
        assert_eq!(longest_sentence_length_lattice(&lat), 1);
    }

    #[test]
    fn test_compact_lattice_counts_ilabels() {
        let mut clat = CompactLattice::new();
        for _ in 0..3 {
            clat.add_state();
        }
        clat.set_start(0);
        clat.add_arc(0, Arc::new(5, 5, clw(&[1, 1]), 1));
        clat.add_arc(1, Arc::new(EPSILON, EPSILON, clw(&[2]), 2));
        clat.set_final(2, clw(&[]));
        assert_eq!(longest_sentence_length_compact_lattice(&clat), 1);
    }

    #[test]
    fn test_unsorted_input() {
        let mut lat = Lattice::new();
        for _ in 0..3 {
            lat.add_state();
        }
        lat.set_start(0);
        lat.add_arc(0, Arc::new(1, 1, lw(0.0, 0.0), 2));
        lat.add_arc(2, Arc::new(2, 2, lw(0.0, 0.0), 1));
        lat.set_final(1, lw(0.0, 0.0));
        assert_eq!(longest_sentence_length_lattice(&lat), 2);
    }
}
