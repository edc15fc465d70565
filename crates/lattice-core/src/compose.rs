//! Composition of a compact lattice with an on-demand deterministic
//! transducer, typically a rescoring language model.
//!
//! The product is built by BFS over `(lattice state, transducer state)`
//! pairs. The transducer side is queried lazily, one `(state, label)` pair
//! at a time; the lattice side is enumerated eagerly.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::fst::{Arc, CompactLattice, Label, StateId, EPSILON};
use crate::semiring::{CompactLatticeWeight, LatticeWeight, Semiring, TropicalWeight};

/// Arc of the on-demand transducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StdArc {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: TropicalWeight,
    pub nextstate: StateId,
}

/// Deterministic transducer expanded on demand: at most one arc matches a
/// given `(state, label)` query. `get_arc` takes `&mut self` because
/// implementations usually cache the states they materialize.
pub trait DeterministicOnDemandFst {
    fn start(&self) -> StateId;
    fn final_weight(&self, state: StateId) -> TropicalWeight;
    fn get_arc(&mut self, state: StateId, olabel: Label) -> Option<StdArc>;
}

/// Intern a state pair, allocating a composed state and scheduling its
/// expansion on first sight.
fn composed_state_for(
    pair: (StateId, StateId),
    composed: &mut CompactLattice,
    state_map: &mut FxHashMap<(StateId, StateId), StateId>,
    state_queue: &mut VecDeque<(StateId, StateId)>,
) -> StateId {
    if let Some(&id) = state_map.get(&pair) {
        return id;
    }
    let id = composed.add_state();
    state_map.insert(pair, id);
    state_queue.push_back(pair);
    id
}

/// Compose a compact lattice with a deterministic on-demand transducer.
///
/// Epsilon arcs on the lattice side pass through without moving the
/// transducer. Word arcs must find a matching transducer arc or they are
/// dropped; on a match the transducer weight folds into the graph component
/// of the lattice weight, and the frame string rides along unchanged. Final
/// weights combine the same way. The result is trimmed before returning.
pub fn compose_compact_lattice_deterministic(
    clat: &CompactLattice,
    det_fst: &mut dyn DeterministicOnDemandFst,
) -> CompactLattice {
    let mut composed = CompactLattice::new();
    let Some(clat_start) = clat.start() else {
        return composed;
    };

    let mut state_map: FxHashMap<(StateId, StateId), StateId> = FxHashMap::default();
    let mut state_queue: VecDeque<(StateId, StateId)> = VecDeque::new();

    let start_pair = (clat_start, det_fst.start());
    let start_state = composed_state_for(
        start_pair,
        &mut composed,
        &mut state_map,
        &mut state_queue,
    );
    composed.set_start(start_state);

    while let Some((s1, s2)) = state_queue.pop_front() {
        let composed_state = state_map[&(s1, s2)];

        // Product of the two final weights, computed by hand: the transducer
        // contribution lands on the graph component.
        let clat_final = clat.final_weight(s1);
        let final_weight = CompactLatticeWeight::new(
            LatticeWeight::new(
                clat_final.weight.value1 + det_fst.final_weight(s2).value,
                clat_final.weight.value2,
            ),
            clat_final.string.clone(),
        );
        if !final_weight.is_zero() {
            composed.set_final(composed_state, final_weight);
        }

        for arc1 in clat.arcs(s1) {
            if arc1.olabel == EPSILON {
                // Epsilon on the lattice: advance it, hold the transducer.
                let next_state = composed_state_for(
                    (arc1.nextstate, s2),
                    &mut composed,
                    &mut state_map,
                    &mut state_queue,
                );
                composed.add_arc(
                    composed_state,
                    Arc::new(EPSILON, EPSILON, arc1.weight.clone(), next_state),
                );
            } else if let Some(arc2) = det_fst.get_arc(s2, arc1.olabel) {
                let next_state = composed_state_for(
                    (arc1.nextstate, arc2.nextstate),
                    &mut composed,
                    &mut state_map,
                    &mut state_queue,
                );
                let composed_weight = CompactLatticeWeight::new(
                    LatticeWeight::new(
                        arc1.weight.weight.value1 + arc2.weight.value,
                        arc1.weight.weight.value2,
                    ),
                    arc1.weight.string.clone(),
                );
                composed.add_arc(
                    composed_state,
                    Arc::new(arc1.ilabel, arc1.olabel, composed_weight, next_state),
                );
            }
            // No matching transducer arc: the path dies here.
        }
    }
    composed.connect();
    composed
}
