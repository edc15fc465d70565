//! Core algorithms over speech-recognition lattices: weighted acyclic
//! multigraphs of competing decoder hypotheses.
//!
//! Two parallel representations are supported. The arc-labeled [`Lattice`]
//! consumes one frame per non-epsilon input label; the [`CompactLattice`]
//! is an acceptor whose weights carry frame-symbol strings, so an arc spans
//! as many frames as its string is long. The algorithms (state-time
//! labeling, forward/backward scoring, beam pruning, per-frame depth
//! limiting, shortest path, word alignment, rescoring, composition with an
//! on-demand deterministic transducer) all assume topologically sorted
//! input and share the [`semiring::Semiring`] cost projection.

pub mod compose;
pub mod depth;
pub mod forward_backward;
pub mod fst;
pub mod prune;
pub mod rescore;
pub mod semiring;
pub mod sentence;
pub mod shortest_path;
pub mod times;
pub mod word_align;

pub use compose::{compose_compact_lattice_deterministic, DeterministicOnDemandFst, StdArc};
pub use depth::{
    compact_lattice_depth, compact_lattice_depth_per_frame, compact_lattice_limit_depth,
};
pub use forward_backward::compute_lattice_alphas_and_betas;
pub use fst::{Arc, CompactLattice, CycleDetected, Fst, Label, Lattice, StateId, EPSILON};
pub use prune::prune_lattice;
pub use rescore::{
    add_word_ins_pen_to_compact_lattice, add_word_ins_pen_to_lattice, rescore_lattice, Decodable,
};
pub use semiring::{
    approx_equal, log_add, log_add_or_max, CompactLatticeWeight, LatticeWeight, Semiring,
    TropicalWeight,
};
pub use sentence::{longest_sentence_length_compact_lattice, longest_sentence_length_lattice};
pub use shortest_path::compact_lattice_shortest_path;
pub use times::{compact_lattice_state_times, lattice_state_times};
pub use word_align::{compact_lattice_to_word_alignment, WordAlignment};
