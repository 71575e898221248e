//! Sample generators and the median reduction.

use rand::Rng;

/// `n` draws from the triangular distribution on `[min, max]` peaking at
/// `mode`, by inverse CDF. A zero-width range yields `n` copies of `min`.
pub fn triangular<R: Rng + ?Sized>(rng: &mut R, min: f64, mode: f64, max: f64, n: usize) -> Vec<f64> {
    let width = max - min;
    if width <= 0.0 {
        return vec![min; n];
    }
    let mode = mode.clamp(min, max);
    let split = (mode - min) / width;

    (0..n)
        .map(|_| {
            let u: f64 = rng.random();
            if u < split {
                min + (u * width * (mode - min)).sqrt()
            } else {
                max - ((1.0 - u) * width * (max - mode)).sqrt()
            }
        })
        .collect()
}

/// `n` draws uniformly from `[low, high)`.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64, n: usize) -> Vec<f64> {
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    (0..n)
        .map(|_| low + rng.random::<f64>() * (high - low))
        .collect()
}

/// Median of `values`; the mean of the middle pair for even lengths.
/// `None` when empty.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
