//! 1-best path extraction from a compact lattice.

use tracing::warn;

use crate::fst::{Arc, CompactLattice, StateId, NO_STATE};
use crate::semiring::{CompactLatticeWeight, Semiring};

/// Extract the single cheapest start-to-final path as a new linear lattice.
///
/// Dynamic programming over the topological order with a predecessor table;
/// a virtual super-final entry collects the best `forward + final` cost.
/// Unsorted input is copied and sorted first (cycles panic). If no final
/// state is reachable the result is empty and a warning is logged. Parallel
/// arcs between consecutive best-path states resolve to the cheapest, the
/// first encountered winning ties.
pub fn compact_lattice_shortest_path(clat: &CompactLattice) -> CompactLattice {
    if !clat.is_top_sorted() {
        let mut clat_copy = clat.clone();
        clat_copy
            .top_sort()
            .expect("unable to topologically sort lattice (cycles found?)");
        return compact_lattice_shortest_path(&clat_copy);
    }
    let mut shortest_path = CompactLattice::new();
    let Some(start) = clat.start() else {
        return shortest_path;
    };
    assert_eq!(start, 0); // top-sorted
    let num_states = clat.num_states();
    let superfinal = num_states;
    let mut best_cost_and_pred: Vec<(f64, StateId)> =
        vec![(f64::INFINITY, NO_STATE); num_states + 1];
    best_cost_and_pred[0].0 = 0.0;
    for s in 0..num_states {
        let my_cost = best_cost_and_pred[s].0;
        for arc in clat.arcs(s as StateId) {
            let next_cost = my_cost + arc.weight.cost();
            if next_cost < best_cost_and_pred[arc.nextstate as usize].0 {
                best_cost_and_pred[arc.nextstate as usize] = (next_cost, s as StateId);
            }
        }
        let tot_final = my_cost + clat.final_weight(s as StateId).cost();
        if tot_final < best_cost_and_pred[superfinal].0 {
            best_cost_and_pred[superfinal] = (tot_final, s as StateId);
        }
    }

    // Walk predecessors back from the super-final to the start.
    let mut states: Vec<StateId> = Vec::new();
    let mut cur_state = superfinal as StateId;
    while cur_state != 0 {
        let prev_state = best_cost_and_pred[cur_state as usize].1;
        if prev_state == NO_STATE {
            warn!("failure in best-path algorithm for lattice (infinite costs?)");
            return shortest_path; // empty
        }
        states.push(prev_state);
        assert!(cur_state != prev_state, "lattice with cycles");
        cur_state = prev_state;
    }
    states.reverse();

    for _ in 0..states.len() {
        shortest_path.add_state();
    }
    for s in 0..states.len() {
        if s == 0 {
            shortest_path.set_start(0);
        }
        if s + 1 < states.len() {
            let mut cur_arc: Option<&Arc<CompactLatticeWeight>> = None;
            for arc in clat.arcs(states[s]) {
                if arc.nextstate == states[s + 1] {
                    let better = match cur_arc {
                        None => true,
                        Some(best) => arc.weight.cost() < best.weight.cost(),
                    };
                    if better {
                        cur_arc = Some(arc);
                    }
                }
            }
            let cur_arc = cur_arc.expect("no arc between consecutive best-path states");
            shortest_path.add_arc(
                s as StateId,
                Arc::new(
                    cur_arc.ilabel,
                    cur_arc.olabel,
                    cur_arc.weight.clone(),
                    s as StateId + 1,
                ),
            );
        } else {
            shortest_path.set_final(s as StateId, clat.final_weight(states[s]).clone());
        }
    }
    shortest_path
}
