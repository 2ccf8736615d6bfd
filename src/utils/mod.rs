//! Combinatorics, summary statistics and small linear-algebra helpers.

mod linalg;

pub use linalg::{log_det_lu, log_det_psd, ridge_inverse};

/// Compute binomial coefficient C(n, k) = n! / (k! * (n-k)!)
///
/// Returns `None` if the result would overflow `u64`.
///
/// # Examples
///
/// ```
/// use maxdiff::utils::binomial;
///
/// assert_eq!(binomial(8, 4), Some(70));
/// assert_eq!(binomial(4, 2), Some(6));
/// assert_eq!(binomial(3, 5), Some(0)); // k > n
/// ```
#[must_use]
pub fn binomial(n: u64, k: u64) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);

    let mut result: u64 = 1;
    for i in 0..k {
        // Exact at every step: result holds C(n, i) * (n - i) before dividing.
        result = result.checked_mul(n - i)? / (i + 1);
    }
    Some(result)
}

/// All k-subsets of `0..n`, in lexicographic order.
///
/// # Examples
///
/// ```
/// use maxdiff::utils::combinations;
///
/// let tasks: Vec<Vec<usize>> = combinations(4, 2).collect();
/// assert_eq!(tasks.len(), 6);
/// assert_eq!(tasks[0], vec![0, 1]);
/// assert_eq!(tasks[5], vec![2, 3]);
/// ```
pub fn combinations(n: usize, k: usize) -> impl Iterator<Item = Vec<usize>> {
    Combinations {
        n,
        k,
        next: (k <= n).then(|| (0..k).collect()),
    }
}

struct Combinations {
    n: usize,
    k: usize,
    next: Option<Vec<usize>>,
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;

        // Advance the rightmost index that still has room.
        let mut following = current.clone();
        let mut i = self.k;
        while i > 0 {
            i -= 1;
            if following[i] < self.n - self.k + i {
                following[i] += 1;
                for j in (i + 1)..self.k {
                    following[j] = following[j - 1] + 1;
                }
                self.next = Some(following);
                break;
            }
        }

        Some(current)
    }
}

/// Arithmetic mean; zero for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; zero for an empty slice.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Coefficient of variation `stdev / mean`; zero when the mean is zero.
#[must_use]
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.abs() < f64::EPSILON {
        return 0.0;
    }
    std_dev(values) / m
}
