//! Correlation statistics
//!
//! Pearson, Spearman and Kendall tau-b coefficients with two-sided p-values.
//!
//! # p-values
//!
//! - Pearson and Spearman: Student's t with `n - 2` degrees of freedom,
//!   evaluated as `I_{1 - r²}((n - 2) / 2, 1 / 2)` through the regularized
//!   incomplete beta function
//! - Kendall: exact null distribution (permutation inversion counts) when
//!   neither sequence has ties and `n <= 33`, or when the discordance count is
//!   0 or 1; otherwise the tie-corrected normal approximation
//!
//! With exactly two pairs every coefficient is ±1 and every p-value is 1.
//! A constant sequence yields NaN for both coefficient and p-value.

use crate::analysis::result::TestStatistic;

const EPSILON: f64 = 1e-15;

/// Largest sample size for the exact Kendall distribution
const KENDALL_EXACT_MAX_N: usize = 33;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function (Lanczos approximation, x > 0)
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut sum = LANCZOS_COEFFICIENTS[0];
    for (i, &c) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Continued fraction for the incomplete beta function (modified Lentz)
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 300;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function `I_x(a, b)`
pub fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Complementary error function (Chebyshev fit, relative error < 1.2e-7)
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Two-sided p-value of a correlation coefficient under Student's t
fn t_test_p_value(r: f64, n: usize) -> f64 {
    if r.is_nan() {
        return f64::NAN;
    }
    if n <= 2 {
        return 1.0;
    }
    let r2 = (r * r).min(1.0);
    if 1.0 - r2 < EPSILON {
        return 0.0;
    }
    let df = (n - 2) as f64;
    incomplete_beta(0.5 * df, 0.5, 1.0 - r2).clamp(0.0, 1.0)
}

/// Pearson correlation coefficient
///
/// Returns NaN when either sequence is constant or the lengths differ.
pub fn pearson_r(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n != y.len() || n < 2 {
        return f64::NAN;
    }
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Pearson correlation with two-sided p-value
pub fn pearson(x: &[f64], y: &[f64]) -> TestStatistic {
    let r = pearson_r(x, y);
    TestStatistic {
        coefficient: r,
        p_value: t_test_p_value(r, x.len()),
    }
}

/// Ranks starting at 1, ties receive the average of their positions
///
/// # Example
///
/// ```
/// use xfeed_dsp::analysis::statistics::rank;
///
/// assert_eq!(rank(&[10.0, 30.0, 20.0, 30.0]), vec![1.0, 3.5, 2.0, 3.5]);
/// ```
pub fn rank(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // positions i..=j share the average rank
        let average = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = average;
        }
        i = j + 1;
    }
    ranks
}

/// Spearman rank correlation with two-sided p-value
pub fn spearman(x: &[f64], y: &[f64]) -> TestStatistic {
    if x.len() != y.len() {
        return TestStatistic {
            coefficient: f64::NAN,
            p_value: f64::NAN,
        };
    }
    let rho = pearson_r(&rank(x), &rank(y));
    TestStatistic {
        coefficient: rho,
        p_value: t_test_p_value(rho, x.len()),
    }
}

/// Sizes of runs of equal values in `values` (which need not be sorted)
fn tie_groups(values: &[f64]) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut groups = Vec::new();
    let mut run = 1;
    for pair in sorted.windows(2) {
        if pair[1] == pair[0] {
            run += 1;
        } else {
            if run > 1 {
                groups.push(run);
            }
            run = 1;
        }
    }
    if run > 1 {
        groups.push(run);
    }
    groups
}

/// P(C <= c) * n! for the number of inversions C of a random permutation of n
///
/// Mahonian numbers accumulated row by row.
fn inversion_count_cdf(n: usize, c: usize) -> f64 {
    let mut row = vec![1.0f64];
    for k in 2..=n {
        let max_inversions = k * (k - 1) / 2;
        let width = max_inversions.min(c) + 1;
        let mut next = vec![0.0f64; width];
        // next[j] = sum_{i=0}^{k-1} row[j - i]
        let mut window = 0.0;
        for (j, slot) in next.iter_mut().enumerate() {
            if j < row.len() {
                window += row[j];
            }
            if j >= k && j - k < row.len() {
                window -= row[j - k];
            }
            *slot = window;
        }
        row = next;
    }
    row.iter().take(c + 1).sum()
}

fn ln_factorial(n: usize) -> f64 {
    ln_gamma(n as f64 + 1.0)
}

/// Exact two-sided p-value for Kendall's tau without ties
fn kendall_exact_p_value(n: usize, discordant: usize) -> f64 {
    if n <= 2 {
        return 1.0;
    }
    let total = n * (n - 1) / 2;
    let c = discordant.min(total - discordant);
    let cdf = inversion_count_cdf(n, c);
    (2.0 * (cdf.ln() - ln_factorial(n)).exp()).clamp(0.0, 1.0)
}

/// Kendall tau-b with two-sided p-value
pub fn kendall(x: &[f64], y: &[f64]) -> TestStatistic {
    let undefined = TestStatistic {
        coefficient: f64::NAN,
        p_value: f64::NAN,
    };
    let n = x.len();
    if n != y.len() || n < 2 {
        return undefined;
    }

    let mut concordant = 0usize;
    let mut discordant = 0usize;
    let mut tied_x = 0usize;
    let mut tied_y = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 {
                tied_x += 1;
            }
            if dy == 0.0 {
                tied_y += 1;
            }
            if dx == 0.0 || dy == 0.0 {
                continue;
            }
            if (dx > 0.0) == (dy > 0.0) {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    let total = n * (n - 1) / 2;
    if tied_x == total || tied_y == total {
        return undefined;
    }

    let s = concordant as f64 - discordant as f64;
    let tau = (s / (((total - tied_x) as f64) * ((total - tied_y) as f64)).sqrt()).clamp(-1.0, 1.0);

    let p_value = if tied_x == 0 && tied_y == 0 {
        let c = discordant.min(total - discordant);
        if n <= KENDALL_EXACT_MAX_N || c <= 1 {
            kendall_exact_p_value(n, discordant)
        } else {
            kendall_asymptotic_p_value(s, n, &[], &[])
        }
    } else {
        kendall_asymptotic_p_value(s, n, &tie_groups(x), &tie_groups(y))
    };

    TestStatistic {
        coefficient: tau,
        p_value,
    }
}

/// Normal approximation for Kendall's S with tie-corrected variance
fn kendall_asymptotic_p_value(s: f64, n: usize, ties_x: &[usize], ties_y: &[usize]) -> f64 {
    let nf = n as f64;
    let m = nf * (nf - 1.0);

    let sums = |groups: &[usize]| {
        groups.iter().fold((0.0, 0.0, 0.0), |(t0, t1, t2), &g| {
            let g = g as f64;
            (
                t0 + g * (g - 1.0),
                t1 + g * (g - 1.0) * (g - 2.0),
                t2 + g * (g - 1.0) * (2.0 * g + 5.0),
            )
        })
    };
    let (x_pairs, x_triples, x_var) = sums(ties_x);
    let (y_pairs, y_triples, y_var) = sums(ties_y);

    let mut variance = (m * (2.0 * nf + 5.0) - x_var - y_var) / 18.0 + x_pairs * y_pairs / (2.0 * m);
    if n > 2 {
        variance += x_triples * y_triples / (9.0 * m * (nf - 2.0));
    }

    if variance <= 0.0 {
        return f64::NAN;
    }
    let z = s.abs() / variance.sqrt();
    erfc(z / std::f64::consts::SQRT_2).clamp(0.0, 1.0)
}
