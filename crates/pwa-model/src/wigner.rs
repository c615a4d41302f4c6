//! Wigner rotation functions for helicity amplitudes.
//!
//! All angular momenta are passed as twice their value, so half-integer spins
//! are exact. Arguments with mismatched parity (a half-integer mixed with an
//! integer) yield zero, as they would physically.

use num_complex::Complex64;

const MAX_FACTORIAL: usize = 40;

fn factorial(n: i32) -> f64 {
    debug_assert!((0..MAX_FACTORIAL as i32).contains(&n));
    let mut acc = 1.0;
    for k in 2..=n {
        acc *= k as f64;
    }
    acc
}

/// Wigner small-d matrix element `d^j_{m',m}(theta)`.
///
/// `j2`, `mp2`, `m2` are twice j, m' and m. Uses the standard factorial-sum
/// closed form.
pub fn wigner_small_d(j2: i32, mp2: i32, m2: i32, theta: f64) -> f64 {
    if j2 < 0 || (j2 + mp2) % 2 != 0 || (j2 + m2) % 2 != 0 {
        return 0.0;
    }
    if mp2.abs() > j2 || m2.abs() > j2 {
        return 0.0;
    }
    let a = (j2 + m2) / 2; // j + m
    let b = (j2 - m2) / 2; // j - m
    let c = (j2 + mp2) / 2; // j + m'
    let d = (j2 - mp2) / 2; // j - m'
    let delta = (m2 - mp2) / 2; // m - m'

    let norm = (factorial(a) * factorial(b) * factorial(c) * factorial(d)).sqrt();
    let half = 0.5 * theta;
    let (sin_half, cos_half) = half.sin_cos();

    let k_min = 0.max(delta);
    let k_max = a.min(d);
    let mut sum = 0.0;
    for k in k_min..=k_max {
        let denom =
            factorial(a - k) * factorial(k) * factorial(d - k) * factorial(k - delta);
        let cos_pow = j2 - 2 * k + delta;
        let sin_pow = 2 * k - delta;
        let sign = if (k - delta) % 2 == 0 { 1.0 } else { -1.0 };
        sum += sign * cos_half.powi(cos_pow) * sin_half.powi(sin_pow) / denom;
    }
    norm * sum
}

/// Conjugated helicity D-function `D^{j*}_{m',m}(phi, theta, 0)`.
///
/// This is the angular factor of a two-body helicity amplitude with the
/// mother helicity m' and the daughter helicity difference m.
pub fn wigner_big_d_conj(j2: i32, mp2: i32, m2: i32, phi: f64, theta: f64) -> Complex64 {
    let d = wigner_small_d(j2, mp2, m2, theta);
    Complex64::from_polar(1.0, 0.5 * mp2 as f64 * phi) * d
}
