//! Mutable vector-backed weighted FST used for both lattice kinds.
//!
//! States own their outgoing arc vectors, which is what the pruning-style
//! algorithms need: they redirect arcs to sentinel states in place and rely
//! on [`Fst::connect`] to purge the garbage afterwards. The container also
//! provides the two topological primitives every algorithm leans on,
//! [`Fst::top_sort`] and [`Fst::connect`].

use std::collections::VecDeque;

use thiserror::Error;

use crate::semiring::{CompactLatticeWeight, LatticeWeight, Semiring};

pub type StateId = u32;
pub type Label = u32;

pub const NO_STATE: StateId = u32::MAX;
pub const EPSILON: Label = 0;

/// Arc-labeled lattice: one frame per non-epsilon input label.
pub type Lattice = Fst<LatticeWeight>;
/// Compact lattice: acceptor whose arc weights carry frame strings.
pub type CompactLattice = Fst<CompactLatticeWeight>;

/// Topological sort found a cycle.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cycles detected in lattice")]
pub struct CycleDetected;

#[derive(Debug, Clone, PartialEq)]
pub struct Arc<W> {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: W,
    pub nextstate: StateId,
}

impl<W> Arc<W> {
    pub fn new(ilabel: Label, olabel: Label, weight: W, nextstate: StateId) -> Self {
        Arc {
            ilabel,
            olabel,
            weight,
            nextstate,
        }
    }
}

#[derive(Debug, Clone)]
struct VectorState<W> {
    final_weight: W,
    arcs: Vec<Arc<W>>,
}

#[derive(Debug, Clone)]
pub struct Fst<W: Semiring> {
    states: Vec<VectorState<W>>,
    start: Option<StateId>,
}

impl<W: Semiring> Default for Fst<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Semiring> Fst<W> {
    pub fn new() -> Self {
        Fst {
            states: Vec::new(),
            start: None,
        }
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn start(&self) -> Option<StateId> {
        self.start
    }

    pub fn set_start(&mut self, state: StateId) {
        self.start = Some(state);
    }

    /// Add a state with zero final weight and no arcs. Returns its id.
    pub fn add_state(&mut self) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(VectorState {
            final_weight: W::zero(),
            arcs: Vec::new(),
        });
        id
    }

    pub fn add_arc(&mut self, state: StateId, arc: Arc<W>) {
        self.states[state as usize].arcs.push(arc);
    }

    pub fn num_arcs(&self, state: StateId) -> usize {
        self.states[state as usize].arcs.len()
    }

    pub fn arcs(&self, state: StateId) -> &[Arc<W>] {
        &self.states[state as usize].arcs
    }

    pub fn arcs_mut(&mut self, state: StateId) -> &mut [Arc<W>] {
        &mut self.states[state as usize].arcs
    }

    pub fn final_weight(&self, state: StateId) -> &W {
        &self.states[state as usize].final_weight
    }

    pub fn set_final(&mut self, state: StateId, weight: W) {
        self.states[state as usize].final_weight = weight;
    }

    /// Remove every state; the FST becomes empty with no start.
    pub fn delete_states(&mut self) {
        self.states.clear();
        self.start = None;
    }

    /// True iff every arc goes to a strictly larger state id, which is the
    /// ordering all core algorithms assume.
    pub fn is_top_sorted(&self) -> bool {
        self.states
            .iter()
            .enumerate()
            .all(|(s, st)| st.arcs.iter().all(|a| (a.nextstate as usize) > s))
    }

    /// Renumber states into topological order, start state first.
    ///
    /// DFS reverse-postorder; the start state's tree is explored last so it
    /// ends up with id 0 (consumers assert `start == 0` after sorting).
    pub fn top_sort(&mut self) -> Result<(), CycleDetected> {
        let n = self.states.len();
        if n == 0 {
            return Ok(());
        }
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;
        let mut color = vec![WHITE; n];
        let mut finish_order: Vec<StateId> = Vec::with_capacity(n);
        let start = self.start;
        let roots = (0..n as StateId).filter(|&s| Some(s) != start).chain(start);

        let mut stack: Vec<(StateId, usize)> = Vec::new();
        for root in roots {
            if color[root as usize] != WHITE {
                continue;
            }
            color[root as usize] = GRAY;
            stack.push((root, 0));
            while let Some((s, arc_index)) = stack.pop() {
                let arcs = &self.states[s as usize].arcs;
                if arc_index < arcs.len() {
                    let dest = arcs[arc_index].nextstate;
                    stack.push((s, arc_index + 1));
                    match color[dest as usize] {
                        WHITE => {
                            color[dest as usize] = GRAY;
                            stack.push((dest, 0));
                        }
                        GRAY => return Err(CycleDetected),
                        _ => {}
                    }
                } else {
                    color[s as usize] = BLACK;
                    finish_order.push(s);
                }
            }
        }

        let mut old_to_new = vec![0 as StateId; n];
        for (i, &s) in finish_order.iter().rev().enumerate() {
            old_to_new[s as usize] = i as StateId;
        }

        let mut indexed: Vec<(StateId, VectorState<W>)> = self
            .states
            .drain(..)
            .enumerate()
            .map(|(old, mut st)| {
                for arc in &mut st.arcs {
                    arc.nextstate = old_to_new[arc.nextstate as usize];
                }
                (old_to_new[old], st)
            })
            .collect();
        indexed.sort_unstable_by_key(|&(id, _)| id);
        self.states = indexed.into_iter().map(|(_, st)| st).collect();
        self.start = start.map(|s| old_to_new[s as usize]);
        Ok(())
    }

    /// Remove states not reachable from the start or with no path to a
    /// final state, renumbering the survivors contiguously. Relative state
    /// order is preserved, so a top-sorted FST stays top-sorted.
    pub fn connect(&mut self) {
        let n = self.states.len();
        let Some(start) = self.start else {
            self.delete_states();
            return;
        };
        if n == 0 {
            self.delete_states();
            return;
        }

        // Forward BFS from the start.
        let mut fwd_reach = vec![false; n];
        let mut queue: VecDeque<StateId> = VecDeque::new();
        fwd_reach[start as usize] = true;
        queue.push_back(start);
        while let Some(s) = queue.pop_front() {
            for arc in &self.states[s as usize].arcs {
                if !fwd_reach[arc.nextstate as usize] {
                    fwd_reach[arc.nextstate as usize] = true;
                    queue.push_back(arc.nextstate);
                }
            }
        }

        // Backward BFS from final states over the reverse adjacency.
        let mut rev: Vec<Vec<StateId>> = vec![Vec::new(); n];
        for (s, st) in self.states.iter().enumerate() {
            for arc in &st.arcs {
                rev[arc.nextstate as usize].push(s as StateId);
            }
        }
        let mut bwd_reach = vec![false; n];
        for (s, st) in self.states.iter().enumerate() {
            if !st.final_weight.is_zero() {
                bwd_reach[s] = true;
                queue.push_back(s as StateId);
            }
        }
        while let Some(s) = queue.pop_front() {
            for &p in &rev[s as usize] {
                if !bwd_reach[p as usize] {
                    bwd_reach[p as usize] = true;
                    queue.push_back(p);
                }
            }
        }

        let mut old_to_new = vec![NO_STATE; n];
        let mut new_id: StateId = 0;
        for i in 0..n {
            if fwd_reach[i] && bwd_reach[i] {
                old_to_new[i] = new_id;
                new_id += 1;
            }
        }
        if new_id as usize == n {
            return;
        }

        let mut new_states = Vec::with_capacity(new_id as usize);
        for (old, mut st) in self.states.drain(..).enumerate() {
            if old_to_new[old] == NO_STATE {
                continue;
            }
            st.arcs.retain(|a| old_to_new[a.nextstate as usize] != NO_STATE);
            for arc in &mut st.arcs {
                arc.nextstate = old_to_new[arc.nextstate as usize];
            }
            new_states.push(st);
        }
        self.states = new_states;
        if old_to_new[start as usize] != NO_STATE {
            self.start = Some(old_to_new[start as usize]);
        } else {
            self.delete_states();
        }
    }
}
