use std::f64::consts::PI;

use num_complex::Complex64;
use sm_core::coeffs::FilterCoefficients;

use crate::error::{DspError, DspResult, check_sample_rate, ensure_finite};
use crate::response::{freqs_zpk, freqz, freqz_zpk, poly, polymul};

/// Fréquence de normalisation de la pondération A (Hz).
pub const A_WEIGHTING_REF_HZ: f64 = 1000.0;

/// Corner frequencies `(f1, f2, f3, f4)` of the analog A-weighting prototype.
///
/// `f1 ≈ 20.6 Hz`, `f2 ≈ 107.7 Hz`, `f3 ≈ 737.9 Hz`, `f4 ≈ 12194 Hz`.
#[must_use]
pub fn corner_frequencies() -> (f64, f64, f64, f64) {
    let fa = 10f64.powf(2.45);
    let d = 0.5f64.sqrt();
    let fr = A_WEIGHTING_REF_HZ;
    let fh = 10f64.powf(3.9);
    let fl = 10f64.powf(1.5);
    let c = fl * fl * fh * fh;
    let bq = (fr * fr + fl * fl * fh * fh / (fr * fr) - d * (fl * fl + fh * fh)) / (1.0 - d);
    let disc = (bq * bq - 4.0 * c).sqrt();
    let f1 = ((-bq - disc) / 2.0).sqrt();
    let f4 = ((-bq + disc) / 2.0).sqrt();
    let sqrt5 = 5f64.sqrt();
    let f2 = (3.0 - sqrt5) / 2.0 * fa;
    let f3 = (3.0 + sqrt5) / 2.0 * fa;
    (f1, f2, f3, f4)
}

/// Conçoit le filtre de pondération A pour `sr`.
///
/// Prototype analogique à 4 zéros à l'origine et 6 pôles réels, transposé en z
/// par `z = exp(s / sr)`. La perte haute fréquence de cette transposition est
/// corrigée par un FIR d'ordre 1 `[b0, b1]` choisi pour égaler la réponse
/// analogique à `sr / 4`, puis le tout est renormalisé à 0 dB à 1 kHz.
///
/// # Errors
/// [`DspError::InvalidSampleRate`] for `sr <= 0`, [`DspError::NumericInstability`]
/// if any step yields a non-finite value.
///
/// # Example
/// ```
/// use sm_dsp::design::a_weighting_coeff;
/// use sm_dsp::response::coeffs_response;
/// let c = a_weighting_coeff(48000.0).unwrap();
/// assert!((coeffs_response(&c, 1000.0, 48000.0).norm() - 1.0).abs() < 1e-9);
/// assert!(coeffs_response(&c, 100.0, 48000.0).norm() < 1.0);
/// ```
pub fn a_weighting_coeff(sr: f64) -> DspResult<FilterCoefficients> {
    let sr = check_sample_rate(sr)?;
    log::info!("Calculating coefficients of A-weighting ({sr} Hz)");

    let (f1, f2, f3, f4) = corner_frequencies();
    let zeros_s = [Complex64::new(0.0, 0.0); 4];
    let poles_s: Vec<Complex64> = [f1, f1, f4, f4, f2, f3]
        .iter()
        .map(|&f| Complex64::new(-2.0 * PI * f, 0.0))
        .collect();

    let ks = 1.0 / freqs_zpk(&zeros_s, &poles_s, 1.0, 2.0 * PI * A_WEIGHTING_REF_HZ).norm();

    // Matched z-transform: z = exp(s / sr)
    let zeros_z: Vec<Complex64> = zeros_s.iter().map(|&z| (z / sr).exp()).collect();
    let poles_z: Vec<Complex64> = poles_s.iter().map(|&p| (p / sr).exp()).collect();
    let kz = 1.0 / freqz_zpk(&zeros_z, &poles_z, 1.0, A_WEIGHTING_REF_HZ, sr).norm();
    check_scalar("gain normalization", ks)?;
    check_scalar("gain normalization", kz)?;

    let f_corr = sr / 4.0;
    let h = (freqs_zpk(&zeros_s, &poles_s, ks, 2.0 * PI * f_corr)
        / freqz_zpk(&zeros_z, &poles_z, kz, f_corr, sr))
    .norm();
    check_scalar("high-frequency correction", h)?;

    let b1c = (Complex64::new(1.0, 0.0) + Complex64::new(2.0 * h * h - 1.0, 0.0).sqrt()) / 2.0;
    let b1 = if b1c.im == 0.0 { b1c.re } else { b1c.norm() };
    let b0 = 1.0 - b1;

    let b_zpk: Vec<f64> = poly(&zeros_z).iter().map(|c| kz * c.re).collect();
    let a: Vec<f64> = poly(&poles_z).iter().map(|c| c.re).collect();
    let mut b = polymul(&b_zpk, &[b0, b1]);

    let g = freqz(&b, &a, A_WEIGHTING_REF_HZ, sr).norm();
    check_scalar("reference renormalization", g)?;
    if g == 0.0 {
        return Err(DspError::NumericInstability {
            stage: "reference renormalization",
            detail: "zero gain at 1 kHz".into(),
        });
    }
    for v in &mut b {
        *v /= g;
    }

    ensure_finite("A-weighting numerator", &b)?;
    ensure_finite("A-weighting denominator", &a)?;
    log::debug!(
        "A-weighting: H(sr/4) = {h:.4}, b1 = {b1:.4}, len(b) = {}, len(a) = {}",
        b.len(),
        a.len()
    );
    Ok(FilterCoefficients::new(b, a)?)
}

fn check_scalar(stage: &'static str, v: f64) -> DspResult<()> {
    ensure_finite(stage, &[v])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{coeffs_response, magnitude_db};

    fn db_at(c: &FilterCoefficients, f: f64, sr: f64) -> f64 {
        magnitude_db(coeffs_response(c, f, sr))
    }

    #[test]
    fn corners_match_standard() {
        let (f1, f2, f3, f4) = corner_frequencies();
        assert!((f1 - 20.599).abs() < 1e-2, "f1 = {f1}");
        assert!((f2 - 107.65).abs() < 1e-2, "f2 = {f2}");
        assert!((f3 - 737.86).abs() < 1e-2, "f3 = {f3}");
        assert!((f4 - 12194.2).abs() < 0.5, "f4 = {f4}");
    }

    #[test]
    fn shape_at_48k() {
        let c = a_weighting_coeff(48000.0).unwrap();
        assert_eq!(c.b().len(), 6);
        assert_eq!(c.a().len(), 7);
        assert!(db_at(&c, 1000.0, 48000.0).abs() < 1e-9);
        assert!((db_at(&c, 31.5, 48000.0) + 39.5).abs() < 0.2);
        assert!((db_at(&c, 100.0, 48000.0) + 19.1).abs() < 0.2);
        assert!((db_at(&c, 4000.0, 48000.0) - 1.0).abs() < 0.2);
        assert!((db_at(&c, 10_000.0, 48000.0) + 2.5).abs() < 0.2);
    }

    #[test]
    fn known_coefficients_at_48k() {
        let c = a_weighting_coeff(48000.0).unwrap();
        let b_ref = [
            0.142_509_328_134_197_87,
            0.042_993_917_768_731_09,
            -1.597_068_952_416_903,
            3.108_150_069_296_343_5,
            -2.309_615_593_087_892,
            0.613_031_230_305_522_5,
        ];
        let a_ref = [
            1.0,
            -4.293_875_999_223_02,
            7.284_717_084_078_574,
            -6.126_271_743_554_58,
            2.610_471_799_551_107,
            -0.511_611_793_876_501_9,
            0.036_570_658_963_247_33,
        ];
        for (x, y) in c.b().iter().zip(b_ref) {
            assert!((x - y).abs() < 1e-9, "b: {x} vs {y}");
        }
        for (x, y) in c.a().iter().zip(a_ref) {
            assert!((x - y).abs() < 1e-9, "a: {x} vs {y}");
        }
    }

    #[test]
    fn normalized_at_other_rates() {
        for sr in [8000.0, 16000.0, 44100.0, 96000.0] {
            let c = a_weighting_coeff(sr).unwrap();
            assert!(db_at(&c, 1000.0, sr).abs() < 1e-9, "sr = {sr}");
            assert!(db_at(&c, 100.0, sr) < -15.0, "sr = {sr}");
        }
    }

    #[test]
    fn rejects_bad_sample_rate() {
        assert!(matches!(
            a_weighting_coeff(-1.0),
            Err(DspError::InvalidSampleRate(_))
        ));
    }
}
