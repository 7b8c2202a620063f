//! Euclidean projection onto a capped simplex.
//!
//! Every employee-day owns a block of variables constrained by
//! `0 <= x_i <= u_i` and `Σ x_i = h`. The projection of a point `v` onto that
//! set is `x_i = clamp(v_i - τ, 0, u_i)` for the unique shift `τ` that makes
//! the block sum to `h`.

const BISECTION_STEPS: usize = 100;

/// Projects `v` onto `{x : 0 <= x <= upper, Σ x = total}`, writing the
/// result to `out`.
///
/// Upper bounds may be `f64::INFINITY`. The caller guarantees the set is
/// non-empty (`Σ upper >= total`); a non-positive `total` projects to zero.
///
/// # Example
///
/// ```
/// use allocation_engine::allocation::project_capped_simplex;
///
/// let mut out = [0.0; 3];
/// project_capped_simplex(&[5.0, 5.0, 5.0], &[f64::INFINITY, f64::INFINITY, 1.0], 8.0, &mut out);
/// assert!((out[0] - 3.5).abs() < 1e-12);
/// assert!((out[1] - 3.5).abs() < 1e-12);
/// assert!((out[2] - 1.0).abs() < 1e-12);
/// ```
pub fn project_capped_simplex(v: &[f64], upper: &[f64], total: f64, out: &mut [f64]) {
    debug_assert_eq!(v.len(), upper.len());
    debug_assert_eq!(v.len(), out.len());

    if v.is_empty() {
        return;
    }
    if total <= 0.0 {
        out.fill(0.0);
        return;
    }

    let shifted_sum = |tau: f64| -> f64 {
        v.iter()
            .zip(upper)
            .map(|(vi, ui)| (vi - tau).clamp(0.0, *ui))
            .sum()
    };

    let min_v = v.iter().copied().fold(f64::INFINITY, f64::min);
    let max_v = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut lo = min_v - total;
    let mut hi = max_v;

    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if shifted_sum(mid) > total {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= f64::EPSILON * hi.abs().max(1.0) {
            break;
        }
    }
    let mut tau = 0.5 * (lo + hi);

    // Solve exactly on the active set found by bisection.
    let mut free_sum = 0.0;
    let mut capped_sum = 0.0;
    let mut free_count = 0usize;
    for (vi, ui) in v.iter().zip(upper) {
        let x = vi - tau;
        if x >= *ui {
            capped_sum += ui;
        } else if x > 0.0 {
            free_sum += vi;
            free_count += 1;
        }
    }
    if free_count > 0 {
        let refined = (free_sum + capped_sum - total) / free_count as f64;
        if (shifted_sum(refined) - total).abs() <= (shifted_sum(tau) - total).abs() {
            tau = refined;
        }
    }

    for ((o, vi), ui) in out.iter_mut().zip(v).zip(upper) {
        *o = (vi - tau).clamp(0.0, *ui);
    }
}

/// Sum of the upper bounds of a block.
pub fn capacity(upper: &[f64]) -> f64 {
    upper.iter().sum()
}
