//! Per-frame depth analytics and depth limiting for compact lattices.
//!
//! The depth of a frame is the number of arcs (and final-weight strings)
//! whose span covers it. The limiter caps that number by dropping the arcs
//! with the worst Viterbi posterior, frame by frame.

use tracing::warn;

use crate::forward_backward::compute_lattice_alphas_and_betas;
use crate::fst::{CompactLattice, StateId};
use crate::semiring::Semiring;
use crate::times::compact_lattice_state_times;

/// One covering arc of some frame: the best logprob of any path through the
/// arc, relative to the lattice best path (so it is zero or negative).
struct LatticeArcRecord {
    logprob: f64,
    state: StateId,
    arc: usize,
}

/// Cap the number of arcs crossing any single frame at
/// `max_depth_per_frame`, keeping the best-scoring ones.
///
/// Dropped arcs are redirected to a dead sentinel state and purged by
/// [`CompactLattice::connect`]; the result is re-sorted if the trim
/// disturbed the state numbering. An un-sortable (cyclic) input panics.
pub fn compact_lattice_limit_depth(max_depth_per_frame: i32, clat: &mut CompactLattice) {
    if clat.start().is_none() {
        warn!("limiting depth of empty lattice");
        return;
    }
    if !clat.is_top_sorted() {
        clat.top_sort()
            .expect("topological sorting of lattice failed");
    }

    let (total_frames, state_times) = compact_lattice_state_times(clat);

    let mut alpha = Vec::new();
    let mut beta = Vec::new();
    let viterbi = true;
    let best_prob = compute_lattice_alphas_and_betas(clat, viterbi, &mut alpha, &mut beta);

    let num_frames = total_frames as usize;
    let mut arc_records: Vec<Vec<LatticeArcRecord>> = Vec::new();
    arc_records.resize_with(num_frames, Vec::new);

    let num_states = clat.num_states();
    for s in 0..num_states {
        for (arc_index, arc) in clat.arcs(s as StateId).iter().enumerate() {
            let logprob =
                (alpha[s] + beta[arc.nextstate as usize] - arc.weight.cost()) - best_prob;
            assert!(logprob < 0.1, "arc posterior above the best path");
            let start_t = state_times[s];
            let arc_frames = arc.weight.string.len() as i32;
            for t in start_t..start_t + arc_frames {
                assert!((t as usize) < num_frames);
                arc_records[t as usize].push(LatticeArcRecord {
                    logprob,
                    state: s as StateId,
                    arc: arc_index,
                });
            }
        }
    }

    // A non-coaccessible state arcs are redirected to; connect removes it.
    let dead_state = clat.add_state();
    let max_depth = max_depth_per_frame as usize;
    for records in arc_records.iter_mut() {
        let size = records.len();
        if size <= max_depth {
            continue;
        }
        // Partition worst-to-best around the cutoff so the records to delete
        // sit in the lower part.
        let cutoff = size - max_depth;
        if cutoff < size {
            records.select_nth_unstable_by(cutoff, |a, b| {
                a.logprob.partial_cmp(&b.logprob).expect("non-NaN posterior")
            });
        }
        for record in &records[..cutoff] {
            let arc = &mut clat.arcs_mut(record.state)[record.arc];
            if arc.nextstate != dead_state {
                arc.nextstate = dead_state;
            }
        }
    }
    clat.connect();
    if !clat.is_top_sorted() {
        clat.top_sort().expect("topological sorting failed");
    }
}

/// Mean depth of the lattice (average arcs crossing a frame, counting
/// final-weight strings) and the frame count. An empty lattice reports
/// depth 1.0 over zero frames.
pub fn compact_lattice_depth(clat: &CompactLattice) -> (f32, i32) {
    assert!(
        clat.is_top_sorted(),
        "input lattice must be topologically sorted"
    );
    if clat.start().is_none() {
        return (1.0, 0);
    }
    let (num_frames, _state_times) = compact_lattice_state_times(clat);
    let mut num_arc_frames: usize = 0;
    for s in 0..clat.num_states() {
        for arc in clat.arcs(s as StateId) {
            num_arc_frames += arc.weight.string.len();
        }
        num_arc_frames += clat.final_weight(s as StateId).string.len();
    }
    (num_arc_frames as f32 / num_frames as f32, num_frames)
}

/// Number of arcs (and final-weight strings) covering each frame.
pub fn compact_lattice_depth_per_frame(clat: &CompactLattice) -> Vec<i32> {
    assert!(
        clat.is_top_sorted(),
        "input lattice must be topologically sorted"
    );
    if clat.start().is_none() {
        return Vec::new();
    }
    let (num_frames, state_times) = compact_lattice_state_times(clat);
    if num_frames <= 0 {
        return Vec::new();
    }
    let mut depth_per_frame = vec![0i32; num_frames as usize];
    for s in 0..clat.num_states() {
        let start_time = state_times[s];
        for arc in clat.arcs(s as StateId) {
            let len = arc.weight.string.len() as i32;
            for t in start_time..start_time + len {
                assert!((t as usize) < num_frames as usize);
                depth_per_frame[t as usize] += 1;
            }
        }
        let final_len = clat.final_weight(s as StateId).string.len() as i32;
        for t in start_time..start_time + final_len {
            assert!((t as usize) < num_frames as usize);
            depth_per_frame[t as usize] += 1;
        }
    }
    depth_per_frame
}
