//! Beam pruning by forward-backward cost.

use tracing::warn;

use crate::fst::Fst;
use crate::semiring::Semiring;

/// Prune away every arc and final weight whose best complete path costs more
/// than `best_final_cost + beam`. Works on either lattice kind.
///
/// The lattice is topologically sorted first if needed; cycles make the
/// whole operation fail with `false`. Pruned arcs are redirected to a fresh
/// non-final sentinel state which [`Fst::connect`] then removes together
/// with anything it left unreachable. Returns `true` iff any state survives.
pub fn prune_lattice<W: Semiring>(beam: f64, lat: &mut Fst<W>) -> bool {
    assert!(beam > 0.0);
    if !lat.is_top_sorted() && lat.top_sort().is_err() {
        warn!("cycles detected in lattice");
        return false;
    }
    let Some(start) = lat.start() else {
        return false;
    };
    let num_states = lat.num_states();
    if num_states == 0 {
        return false;
    }

    // Viterbi forward costs. A topologically sorted acyclic lattice cannot
    // reach the start for less than zero.
    let mut cost = vec![f64::INFINITY; num_states];
    cost[start as usize] = 0.0;
    let mut best_final_cost = f64::INFINITY;
    for state in 0..num_states {
        let this_forward_cost = cost[state];
        for arc in lat.arcs(state as u32) {
            let nextstate = arc.nextstate as usize;
            assert!(nextstate > state && nextstate < num_states);
            let next_forward_cost = this_forward_cost + arc.weight.cost();
            if cost[nextstate] > next_forward_cost {
                cost[nextstate] = next_forward_cost;
            }
        }
        let this_final_cost = this_forward_cost + lat.final_weight(state as u32).cost();
        if this_final_cost < best_final_cost {
            best_final_cost = this_final_cost;
        }
    }

    let bad_state = lat.add_state(); // not final
    let cutoff = best_final_cost + beam;

    // Backward sweep sharing the same buffer: in descending order, slot
    // `state` still holds the forward cost when read, while every
    // `nextstate > state` slot already holds the backward cost.
    for state in (0..num_states).rev() {
        let this_forward_cost = cost[state];
        let mut this_backward_cost = lat.final_weight(state as u32).cost();
        if this_backward_cost + this_forward_cost > cutoff
            && this_backward_cost != f64::INFINITY
        {
            lat.set_final(state as u32, W::zero());
        }
        for arc in lat.arcs_mut(state as u32) {
            let nextstate = arc.nextstate as usize;
            assert!(nextstate > state && nextstate < num_states);
            let arc_backward_cost = arc.weight.cost() + cost[nextstate];
            let this_fb_cost = this_forward_cost + arc_backward_cost;
            if arc_backward_cost < this_backward_cost {
                this_backward_cost = arc_backward_cost;
            }
            if this_fb_cost > cutoff {
                arc.nextstate = bad_state;
            }
        }
        cost[state] = this_backward_cost;
    }
    lat.connect();
    lat.num_states() > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::{Arc, Lattice, StateId};
    use crate::semiring::LatticeWeight;

    fn lw(a: f32, b: f32) -> LatticeWeight {
        LatticeWeight::new(a, b)
    }

    /// Two paths 0->1->2 (cheap) and 0->3->2 (expensive).
    fn two_path_lattice() -> Lattice {
        let mut lat = Lattice::new();
        for _ in 0..4 {
            lat.add_state();
        }
        lat.set_start(0);
        lat.add_arc(0, Arc::new(1, 1, lw(0.1, 0.0), 1));
        lat.add_arc(1, Arc::new(2, 2, lw(0.1, 0.0), 2));
        lat.add_arc(0, Arc::new(3, 3, lw(5.0, 0.0), 3));
        lat.add_arc(3, Arc::new(4, 4, lw(5.0, 0.0), 2));
        lat.set_final(2, lw(0.0, 0.0));
        lat
    }

    #[test]
    fn test_prune_drops_far_path() {
        let mut lat = two_path_lattice();
        assert!(prune_lattice(1.0, &mut lat));
        // Only 0 -> 1 -> 2 remains after the trim.
        assert_eq!(lat.num_states(), 3);
        assert_eq!(lat.num_arcs(0), 1);
        assert_eq!(lat.arcs(0)[0].ilabel, 1);
    }

    #[test]
    fn test_prune_wide_beam_keeps_all() {
        let mut lat = two_path_lattice();
        assert!(prune_lattice(100.0, &mut lat));
        assert_eq!(lat.num_states(), 4);
        assert_eq!(lat.num_arcs(0), 2);
    }

    #[test]
    fn test_prune_keeps_best_path_with_tiny_beam() {
        let mut lat = two_path_lattice();
        assert!(prune_lattice(1e-6, &mut lat));
        // The best path always survives.
        let mut state: StateId = lat.start().unwrap();
        let mut total = 0.0;
        while lat.final_weight(state).is_zero() {
            assert_eq!(lat.num_arcs(state), 1);
            let arc = &lat.arcs(state)[0];
            total += arc.weight.cost();
            state = arc.nextstate;
        }
        assert!((total - 0.2f32 as f64).abs() < 1e-6);
    }

    #[test]
    fn test_prune_clears_costly_final_weight() {
        // State 1 is final but expensive; state 2 is final and cheap.
        let mut lat = Lattice::new();
        for _ in 0..3 {
            lat.add_state();
        }
        lat.set_start(0);
        lat.add_arc(0, Arc::new(1, 1, lw(0.0, 0.0), 1));
        lat.add_arc(1, Arc::new(2, 2, lw(0.0, 0.0), 2));
        lat.set_final(1, lw(10.0, 0.0));
        lat.set_final(2, lw(0.0, 0.0));
        assert!(prune_lattice(1.0, &mut lat));
        assert_eq!(lat.num_states(), 3);
        assert!(lat.final_weight(1).is_zero());
        assert!(!lat.final_weight(2).is_zero());
    }

    #[test]
    fn test_prune_unsorted_input_gets_sorted() {
        // Same two-path shape but with permuted state ids.
        let mut lat = Lattice::new();
        for _ in 0..4 {
            lat.add_state();
        }
        lat.set_start(1);
        lat.add_arc(1, Arc::new(1, 1, lw(0.1, 0.0), 3));
        lat.add_arc(3, Arc::new(2, 2, lw(0.1, 0.0), 0));
        lat.add_arc(1, Arc::new(3, 3, lw(5.0, 0.0), 2));
        lat.add_arc(2, Arc::new(4, 4, lw(5.0, 0.0), 0));
        lat.set_final(0, lw(0.0, 0.0));
        assert!(prune_lattice(1.0, &mut lat));
        assert_eq!(lat.num_states(), 3);
        assert_eq!(lat.start(), Some(0));
    }

    #[test]
    fn test_prune_cyclic_fails() {
        let mut lat = Lattice::new();
        lat.add_state();
        lat.add_state();
        lat.set_start(0);
        lat.add_arc(0, Arc::new(1, 1, lw(0.0, 0.0), 1));
        lat.add_arc(1, Arc::new(2, 2, lw(0.0, 0.0), 0));
        lat.set_final(1, lw(0.0, 0.0));
        assert!(!prune_lattice(1.0, &mut lat));
    }

    #[test]
    fn test_prune_empty_fails() {
        let mut lat = Lattice::new();
        assert!(!prune_lattice(1.0, &mut lat));
    }

    #[test]
    fn test_prune_compact_lattice() {
        use crate::semiring::CompactLatticeWeight;

        let clw = |a: f32, b: f32, s: &[u32]| {
            CompactLatticeWeight::new(LatticeWeight::new(a, b), s.to_vec())
        };
        let mut clat = crate::fst::CompactLattice::new();
        for _ in 0..3 {
            clat.add_state();
        }
        clat.set_start(0);
        clat.add_arc(0, Arc::new(1, 1, clw(0.1, 0.0, &[5]), 1));
        clat.add_arc(0, Arc::new(2, 2, clw(9.0, 0.0, &[6]), 1));
        clat.add_arc(1, Arc::new(3, 3, clw(0.1, 0.0, &[7]), 2));
        clat.set_final(2, clw(0.0, 0.0, &[]));
        assert!(prune_lattice(1.0, &mut clat));
        assert_eq!(clat.num_arcs(0), 1);
        assert_eq!(clat.arcs(0)[0].ilabel, 1);
    }

    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }

        fn cost(&mut self) -> f32 {
            (self.below(500) as f32) / 100.0
        }
    }

    /// Random acyclic lattice: a spine 0 -> 1 -> ... -> n-1 plus extra
    /// forward arcs, final at the last state.
    fn random_lattice(rng: &mut XorShift, num_states: usize) -> Lattice {
        let mut lat = Lattice::new();
        for _ in 0..num_states {
            lat.add_state();
        }
        lat.set_start(0);
        for s in 0..num_states - 1 {
            let label = rng.below(50) as u32 + 1;
            lat.add_arc(
                s as StateId,
                Arc::new(label, label, lw(rng.cost(), rng.cost()), s as StateId + 1),
            );
        }
        for _ in 0..num_states * 2 {
            let src = rng.below(num_states as u64 - 1) as usize;
            let dst = src + 1 + rng.below((num_states - src - 1) as u64) as usize;
            let label = rng.below(50) as u32 + 1;
            lat.add_arc(
                src as StateId,
                Arc::new(label, label, lw(rng.cost(), rng.cost()), dst as StateId),
            );
        }
        lat.set_final(num_states as StateId - 1, lw(0.0, 0.0));
        lat
    }

    #[test]
    fn test_prune_soundness_random() {
        use crate::forward_backward::compute_lattice_alphas_and_betas;

        let mut rng = XorShift(0x9e3779b97f4a7c15);
        for trial in 0..10 {
            let mut lat = random_lattice(&mut rng, 30);
            let mut alpha = Vec::new();
            let mut beta = Vec::new();
            let best_before =
                compute_lattice_alphas_and_betas(&lat, true, &mut alpha, &mut beta);
            let beam = 2.0;
            assert!(prune_lattice(beam, &mut lat), "trial {trial}");

            // The best path survives with its score intact, and every
            // surviving arc still lies on some path within the beam.
            let best_after =
                compute_lattice_alphas_and_betas(&lat, true, &mut alpha, &mut beta);
            assert!((best_before - best_after).abs() < 1e-9, "trial {trial}");
            for s in 0..lat.num_states() {
                for arc in lat.arcs(s as StateId) {
                    let through_like =
                        alpha[s] - arc.weight.cost() + beta[arc.nextstate as usize];
                    assert!(
                        through_like >= best_before - beam - 1e-6,
                        "trial {trial}: arc from {s} outside the beam"
                    );
                }
            }
        }
    }
}
