//! Évaluation de réponses en fréquence (analogique et numérique).
//!
//! Used by the designers to normalize gains and by tests to check curves.

use std::f64::consts::PI;

use num_complex::Complex64;
use sm_core::coeffs::{Cascade, FilterCoefficients};

/// Analog zero/pole/gain response at angular frequency `w` (rad/s).
///
/// # Example
/// ```
/// use sm_dsp::response::freqs_zpk;
/// use num_complex::Complex64;
/// // 1 / (s + 1) at w = 1 → |H| = 1/√2
/// let h = freqs_zpk(&[], &[Complex64::new(-1.0, 0.0)], 1.0, 1.0);
/// assert!((h.norm() - 0.5f64.sqrt()).abs() < 1e-12);
/// ```
#[must_use]
pub fn freqs_zpk(zeros: &[Complex64], poles: &[Complex64], k: f64, w: f64) -> Complex64 {
    let s = Complex64::new(0.0, w);
    eval_zpk(zeros, poles, k, s)
}

/// Digital zero/pole/gain response at `freq` Hz for sample rate `sr`.
#[must_use]
pub fn freqz_zpk(
    zeros: &[Complex64],
    poles: &[Complex64],
    k: f64,
    freq: f64,
    sr: f64,
) -> Complex64 {
    let z = Complex64::from_polar(1.0, 2.0 * PI * freq / sr);
    eval_zpk(zeros, poles, k, z)
}

#[inline]
fn eval_zpk(zeros: &[Complex64], poles: &[Complex64], k: f64, x: Complex64) -> Complex64 {
    let num = zeros
        .iter()
        .fold(Complex64::new(k, 0.0), |acc, &z| acc * (x - z));
    poles.iter().fold(num, |acc, &p| acc / (x - p))
}

/// Transfer-function response `B(e^jω) / A(e^jω)` at `freq` Hz.
///
/// # Example
/// ```
/// use sm_dsp::response::freqz;
/// // Two-tap average: unity at DC, null at Nyquist.
/// assert!((freqz(&[0.5, 0.5], &[1.0], 0.0, 48000.0).norm() - 1.0).abs() < 1e-12);
/// assert!(freqz(&[0.5, 0.5], &[1.0], 24000.0, 48000.0).norm() < 1e-12);
/// ```
#[must_use]
pub fn freqz(b: &[f64], a: &[f64], freq: f64, sr: f64) -> Complex64 {
    let zi = Complex64::from_polar(1.0, -2.0 * PI * freq / sr);
    horner(b, zi) / horner(a, zi)
}

/// Polynomial in z⁻¹ evaluated at `zi` (coefficients in increasing delay).
#[inline]
fn horner(c: &[f64], zi: Complex64) -> Complex64 {
    c.iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &v| acc * zi + v)
}

/// [`freqz`] for a [`FilterCoefficients`] set.
#[must_use]
pub fn coeffs_response(coeffs: &FilterCoefficients, freq: f64, sr: f64) -> Complex64 {
    freqz(coeffs.b(), coeffs.a(), freq, sr)
}

/// Product of every section response of a cascade at `freq` Hz.
#[must_use]
pub fn sosfreqz(cascade: &Cascade, freq: f64, sr: f64) -> Complex64 {
    cascade
        .sections()
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, s| {
            acc * freqz(&s.b, &s.a, freq, sr)
        })
}

/// `20·log10(|h|)`.
#[inline]
#[must_use]
pub fn magnitude_db(h: Complex64) -> f64 {
    20.0 * h.norm().log10()
}

/// Coefficients of the monic polynomial whose roots are `roots`
/// (highest power first).
///
/// # Example
/// ```
/// use sm_dsp::response::poly;
/// use num_complex::Complex64;
/// let c = poly(&[Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)]);
/// let re: Vec<f64> = c.iter().map(|v| v.re).collect();
/// assert_eq!(re, vec![1.0, -3.0, 2.0]);
/// ```
#[must_use]
pub fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &r in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * r;
        }
        coeffs = next;
    }
    coeffs
}

/// Polynomial product (convolution) of two real coefficient vectors.
#[must_use]
pub fn polymul(x: &[f64], y: &[f64]) -> Vec<f64> {
    if x.is_empty() || y.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; x.len() + y.len() - 1];
    for (i, &u) in x.iter().enumerate() {
        for (j, &v) in y.iter().enumerate() {
            out[i + j] += u * v;
        }
    }
    out
}
