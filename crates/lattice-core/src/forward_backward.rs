//! Forward/backward (alpha/beta) scores over a topologically sorted lattice.

use tracing::warn;

use crate::fst::Fst;
use crate::semiring::{approx_equal, log_add_or_max, Semiring};

/// Compute alphas and betas as negated costs (log-likelihoods), under log
/// combination or Viterbi (`max`) combination. Works on either lattice kind.
///
/// Returns the total probability (or best-path negated cost): the mean of
/// the forward and backward totals, which agree up to rounding. A relative
/// divergence beyond 1e-8 is reported but not fatal.
///
/// `alpha` and `beta` are caller-owned scratch; they are cleared and resized
/// to the number of states.
pub fn compute_lattice_alphas_and_betas<W: Semiring>(
    lat: &Fst<W>,
    viterbi: bool,
    alpha: &mut Vec<f64>,
    beta: &mut Vec<f64>,
) -> f64 {
    assert!(
        lat.is_top_sorted(),
        "input lattice must be topologically sorted"
    );
    assert_eq!(lat.start(), Some(0));
    let num_states = lat.num_states();
    alpha.clear();
    alpha.resize(num_states, f64::NEG_INFINITY);
    beta.clear();
    beta.resize(num_states, f64::NEG_INFINITY);

    let mut tot_forward_prob = f64::NEG_INFINITY;
    alpha[0] = 0.0;
    for s in 0..num_states {
        let this_alpha = alpha[s];
        for arc in lat.arcs(s as u32) {
            let arc_like = -arc.weight.cost();
            let next = arc.nextstate as usize;
            alpha[next] = log_add_or_max(viterbi, alpha[next], this_alpha + arc_like);
        }
        let final_weight = lat.final_weight(s as u32);
        if !final_weight.is_zero() {
            let final_like = this_alpha - final_weight.cost();
            tot_forward_prob = log_add_or_max(viterbi, tot_forward_prob, final_like);
        }
    }
    for s in (0..num_states).rev() {
        let mut this_beta = -lat.final_weight(s as u32).cost();
        for arc in lat.arcs(s as u32) {
            let arc_like = -arc.weight.cost();
            let arc_beta = beta[arc.nextstate as usize] + arc_like;
            this_beta = log_add_or_max(viterbi, this_beta, arc_beta);
        }
        beta[s] = this_beta;
    }
    let tot_backward_prob = beta[0];
    if !approx_equal(tot_forward_prob, tot_backward_prob, 1e-8) {
        warn!(
            tot_forward_prob,
            tot_backward_prob, "total forward and backward probabilities disagree"
        );
    }
    0.5 * (tot_backward_prob + tot_forward_prob)
}
