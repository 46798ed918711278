//! Sample statistics shared by the cut-level algorithms.

use std::cmp::Ordering;

/// Finite samples of `data`, in order.
pub fn finite_values(data: &[f32]) -> Vec<f32> {
    data.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Finite minimum and maximum.
pub fn finite_minmax(data: &[f32]) -> Option<(f32, f32)> {
    let mut it = data.iter().copied().filter(|v| v.is_finite());
    let first = it.next()?;
    Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// Mean and population standard deviation of finite samples.
pub fn mean_std(data: &[f32]) -> Option<(f64, f64)> {
    let mut n = 0usize;
    let mut sum = 0.0f64;
    for &v in data.iter().filter(|v| v.is_finite()) {
        n += 1;
        sum += v as f64;
    }
    if n == 0 {
        return None;
    }
    let mean = sum / n as f64;
    let var = data
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n as f64;
    Some((mean, var.sqrt()))
}

/// Median of a non-empty buffer; reorders it.
pub fn median_mut(data: &mut [f32]) -> f32 {
    debug_assert!(!data.is_empty());
    let len = data.len();
    let mid = len / 2;
    let (left, m, _) = data.select_nth_unstable_by(mid, total_cmp);
    let upper = *m;
    if len % 2 == 1 {
        upper
    } else {
        let lower = left.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        0.5 * (lower + upper)
    }
}

/// Up to `num_points` finite samples taken at an even stride.
pub fn sample_finite(data: &[f32], num_points: usize) -> Vec<f32> {
    let finite = finite_values(data);
    let stride = (finite.len() / num_points.max(1)).max(1);
    finite.into_iter().step_by(stride).take(num_points).collect()
}

fn total_cmp(a: &f32, b: &f32) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Sorts finite samples ascending.
pub fn sort_samples(samples: &mut [f32]) {
    samples.sort_unstable_by(total_cmp);
}

/// Mirrors an index into `[0, n)` with edge repetition (`d c b a | a b c d`).
fn reflect(i: isize, n: isize) -> usize {
    let period = 2 * n;
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i - 1;
    }
    i as usize
}

/// Square median filter of side `size` over a single-band image.
///
/// Borders are handled by reflection. Non-finite samples are left out of
/// each window; a window with no finite sample yields NaN.
pub fn median_filter(data: &[f32], width: usize, height: usize, size: usize) -> Vec<f32> {
    let size = size.max(1);
    let before = (size / 2) as isize;
    let (w, h) = (width as isize, height as isize);
    let mut window = Vec::with_capacity(size * size);
    let mut out = Vec::with_capacity(data.len());
    for y in 0..h {
        for x in 0..w {
            window.clear();
            for dy in 0..size as isize {
                let sy = reflect(y + dy - before, h);
                for dx in 0..size as isize {
                    let sx = reflect(x + dx - before, w);
                    let v = data[sy * width + sx];
                    if v.is_finite() {
                        window.push(v);
                    }
                }
            }
            out.push(if window.is_empty() { f32::NAN } else { median_mut(&mut window) });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_median_odd_even() {
        assert_eq!(median_mut(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median_mut(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_mean_std_ignores_nan() {
        let (m, s) = mean_std(&[1.0, f32::NAN, 3.0]).unwrap();
        assert_relative_eq!(m, 2.0);
        assert_relative_eq!(s, 1.0);
        assert!(mean_std(&[f32::NAN]).is_none());
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
    }

    #[test]
    fn test_median_filter_removes_spike() {
        let mut data = vec![1.0f32; 25];
        data[12] = 100.0;
        let out = median_filter(&data, 5, 5, 3);
        assert_eq!(out[12], 1.0);
    }

    #[test]
    fn test_sample_finite_stride() {
        let data: Vec<f32> = (0..100).map(|v| v as f32).collect();
        let s = sample_finite(&data, 10);
        assert_eq!(s.len(), 10);
        assert_eq!(s[1], 10.0);
    }
}
