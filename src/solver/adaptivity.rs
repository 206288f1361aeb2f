//! Adaptive local polynomial degree (p-adaptivity).
//!
//! A spectral-decay indicator measures, per element, the fraction of modal
//! energy carried by the top mode shell. A large fraction means the local
//! expansion has not converged: the element is raised one level (1 -> 4 ->
//! 10, up to `ndofmax`). A small fraction lets it drop one level, never
//! below 1. Shock-marked cells bypass the indicator and derefine one level
//! per pass: a limited discontinuity carries no usable high-order content,
//! and holding it at low order keeps the limiter cheap and the scheme
//! monotone. Newly activated coefficients start at zero; deactivated ones
//! are zeroed.

use crate::fields::Fields;

/// Spectral-decay indicator: per-component ratio of top-shell modal energy
/// to total modal energy, averaged over components.
///
/// For a P1 element the top shell is modes 1..3; for P2, modes 4..9.
/// Components whose total modal energy is negligible against the largest
/// component carry only round-off; their ratios are meaningless and are
/// left out of the average.
pub fn spectral_decay_indicator(
    ncomp: usize,
    rdof: usize,
    ndofel_e: usize,
    e: usize,
    u: &Fields,
) -> f64 {
    if ndofel_e <= 1 {
        return 0.0;
    }

    let shell_lo = if ndofel_e > 4 { 4 } else { 1 };
    let shell_hi = ndofel_e;

    let mut top = vec![0.0; ncomp];
    let mut total = vec![0.0; ncomp];
    let mut tmax = 0.0f64;
    for c in 0..ncomp {
        let mark = c * rdof;
        total[c] = u.get(e, mark) * u.get(e, mark);
        for idof in 1..shell_hi {
            let v = u.get(e, mark + idof);
            total[c] += v * v;
            if idof >= shell_lo {
                top[c] += v * v;
            }
        }
        tmax = tmax.max(total[c]);
    }

    let floor = 1.0e-16 * tmax;
    let mut ratio = 0.0;
    for c in 0..ncomp {
        if total[c] > floor {
            ratio += top[c] / total[c];
        }
    }

    ratio / ncomp as f64
}

/// Evaluate the indicator and adjust `ndofel` between levels 1, 4 and 10.
///
/// Cells flagged by the discontinuity indicator drop one level regardless
/// of their spectral content; unmarked cells follow the spectral-decay
/// rule.
#[allow(clippy::too_many_arguments)]
pub fn eval_ndof(
    ncomp: usize,
    rdof: usize,
    ndofmax: usize,
    tolref: f64,
    tolderef: f64,
    shockmarker: &[usize],
    u: &Fields,
    ndofel: &mut [usize],
) {
    for e in 0..u.nunk() {
        if shockmarker[e] == 1 {
            ndofel[e] = lower(ndofel[e]);
            continue;
        }

        let ind = spectral_decay_indicator(ncomp, rdof, ndofel[e], e, u);

        if ind > tolref && ndofel[e] < ndofmax {
            ndofel[e] = raise(ndofel[e]).min(ndofmax);
        } else if ind < tolderef {
            ndofel[e] = lower(ndofel[e]);
        }
    }
}

/// Zero all coefficients above each element's active dof count.
///
/// Called after the dof counts change, so raised elements start their new
/// modes from zero and lowered elements carry no stale content.
pub fn reset_adap_sol(rdof: usize, ndofel: &[usize], u: &mut Fields, p: &mut Fields) {
    let ncomp = u.nprop() / rdof;
    let nprim = p.nprop() / rdof;

    for (e, &nd) in ndofel.iter().enumerate() {
        if nd >= rdof {
            continue;
        }
        for c in 0..ncomp {
            let mark = c * rdof;
            for idof in nd..rdof {
                u.set(e, mark + idof, 0.0);
            }
        }
        for c in 0..nprim {
            let mark = c * rdof;
            for idof in nd..rdof {
                p.set(e, mark + idof, 0.0);
            }
        }
    }
}

#[inline]
fn raise(ndof: usize) -> usize {
    match ndof {
        1 => 4,
        4 => 10,
        n => n,
    }
}

#[inline]
fn lower(ndof: usize) -> usize {
    match ndof {
        10 => 4,
        4 => 1,
        n => n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_element_drops_order() {
        let rdof = 10;
        let mut u = Fields::new(1, rdof);
        // constant solution: no high-order content at all
        u.set(0, 0, 5.0);
        let mut ndofel = vec![4usize];
        eval_ndof(1, rdof, 10, 0.5, 1.0e-2, &[0], &u, &mut ndofel);
        assert_eq!(ndofel[0], 1);
    }

    #[test]
    fn test_unresolved_element_rises() {
        let rdof = 10;
        let mut u = Fields::new(1, rdof);
        u.set(0, 0, 1.0);
        // strong P1 content relative to the mean
        u.set(0, 1, 0.9);
        u.set(0, 2, 0.8);
        u.set(0, 3, 0.7);
        let mut ndofel = vec![4usize];
        eval_ndof(1, rdof, 10, 0.5, 1.0e-2, &[0], &u, &mut ndofel);
        assert_eq!(ndofel[0], 10);
    }

    #[test]
    fn test_rise_respects_ndofmax() {
        let rdof = 10;
        let mut u = Fields::new(1, rdof);
        u.set(0, 0, 1.0);
        u.set(0, 1, 1.0);
        let mut ndofel = vec![4usize];
        eval_ndof(1, rdof, 4, 0.5, 1.0e-2, &[0], &u, &mut ndofel);
        assert_eq!(ndofel[0], 4);
    }

    #[test]
    fn test_marked_element_drops_despite_content() {
        let rdof = 10;
        let mut u = Fields::new(1, rdof);
        u.set(0, 0, 1.0);
        // plenty of high-order content, but the cell is shock-marked
        for i in 1..rdof {
            u.set(0, i, 0.5);
        }
        let mut ndofel = vec![4usize];
        eval_ndof(1, rdof, 10, 0.5, 1.0e-2, &[1], &u, &mut ndofel);
        assert_eq!(ndofel[0], 1);
    }

    #[test]
    fn test_reset_zeroes_inactive_dofs() {
        let rdof = 10;
        let mut u = Fields::new(1, rdof);
        let mut p = Fields::new(1, rdof);
        for i in 0..rdof {
            u.set(0, i, 1.0);
            p.set(0, i, 2.0);
        }
        let ndofel = vec![4usize];
        reset_adap_sol(rdof, &ndofel, &mut u, &mut p);
        for i in 0..4 {
            assert_eq!(u.get(0, i), 1.0);
        }
        for i in 4..rdof {
            assert_eq!(u.get(0, i), 0.0);
            assert_eq!(p.get(0, i), 0.0);
        }
    }
}
