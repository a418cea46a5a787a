use std::f64::consts::PI;

use num_complex::Complex64;
use sm_core::coeffs::{Cascade, Sos};

use crate::error::{DspError, DspResult, check_sample_rate};
use crate::response::sosfreqz;

/// Imaginary part below which a digital pole is treated as real.
const REAL_POLE_EPS: f64 = 1e-12;

/// Butterworth passe-bande d'ordre `order` réalisé en cascade de biquads.
///
/// Équivalent à `butter(order, [lo, hi], btype='bandpass', fs=sr)` : 2·order
/// pôles, `order` sections. Chaque section a ses zéros en z = ±1 (numérateur
/// `[1, 0, −1]`); le gain unité au centre géométrique pré-distordu est réparti
/// également sur les sections.
///
/// # Errors
/// [`DspError::InvalidBand`] unless `0 < lo < hi < sr/2`,
/// [`DspError::NumericInstability`] for `order == 0` or any unstable section.
///
/// # Example
/// ```
/// use sm_dsp::design::butter_bandpass_sos;
/// use sm_dsp::response::sosfreqz;
/// let c = butter_bandpass_sos(6, 707.1, 1414.2, 48000.0).unwrap();
/// assert_eq!(c.len(), 6);
/// assert!(c.is_stable());
/// assert!((sosfreqz(&c, 1000.0, 48000.0).norm() - 1.0).abs() < 1e-3);
/// ```
pub fn butter_bandpass_sos(order: usize, lo: f64, hi: f64, sr: f64) -> DspResult<Cascade> {
    let sr = check_sample_rate(sr)?;
    let nyquist = sr / 2.0;
    if !(lo > 0.0 && lo < hi && hi < nyquist) {
        return Err(DspError::InvalidBand {
            low: lo,
            high: hi,
            nyquist,
        });
    }
    if order == 0 {
        return Err(DspError::NumericInstability {
            stage: "butterworth",
            detail: "order must be >= 1".into(),
        });
    }

    // Pre-warped analog edges
    let fs2 = 2.0 * sr;
    let w1 = fs2 * (PI * lo / sr).tan();
    let w2 = fs2 * (PI * hi / sr).tan();
    let bw = w2 - w1;
    let w0 = (w1 * w2).sqrt();

    let n = order as f64;
    let mut complex_poles = Vec::with_capacity(order);
    let mut real_poles = Vec::new();
    for k in 0..order {
        // Odd orders: the middle prototype pole is exactly -1
        let proto = if 2 * k + 1 == order {
            Complex64::new(-1.0, 0.0)
        } else {
            Complex64::from_polar(1.0, PI * (2.0 * k as f64 + n + 1.0) / (2.0 * n))
        };
        let pl = proto * (bw / 2.0);
        let root = (pl * pl - w0 * w0).sqrt();
        for s in [pl + root, pl - root] {
            let z = (fs2 + s) / (fs2 - s);
            if z.im > REAL_POLE_EPS {
                complex_poles.push(z);
            } else if z.im.abs() <= REAL_POLE_EPS {
                real_poles.push(z.re);
            }
        }
    }
    complex_poles.sort_by(|x, y| x.norm().total_cmp(&y.norm()));
    real_poles.sort_by(f64::total_cmp);

    let mut sections: Vec<Sos> = complex_poles
        .iter()
        .map(|p| Sos::new([1.0, 0.0, -1.0], -2.0 * p.re, p.norm_sqr()))
        .collect();
    for pair in real_poles.chunks(2) {
        let p1 = pair[0];
        let p2 = pair.get(1).copied().unwrap_or(0.0);
        sections.push(Sos::new([1.0, 0.0, -1.0], -(p1 + p2), p1 * p2));
    }

    if let Some((i, s)) = sections
        .iter()
        .enumerate()
        .find(|(_, s)| !(s.is_finite() && s.is_stable()))
    {
        return Err(DspError::NumericInstability {
            stage: "butterworth",
            detail: format!("section {i} unstable: a = {:?}", s.a),
        });
    }

    let wc = 2.0 * (w0 / fs2).atan();
    let f_center = wc * sr / (2.0 * PI);
    let h = sosfreqz(&Cascade::new(sections.clone())?, f_center, sr).norm();
    if !(h.is_finite() && h > 0.0) {
        return Err(DspError::NumericInstability {
            stage: "butterworth gain",
            detail: format!("|H({f_center:.2} Hz)| = {h}"),
        });
    }
    let per_section = (1.0 / h).powf(1.0 / sections.len() as f64);
    for s in &mut sections {
        for v in &mut s.b {
            *v *= per_section;
        }
    }

    Ok(Cascade::new(sections)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_at_1k() {
        let lo = 1000.0 / 2f64.sqrt();
        let hi = 1000.0 * 2f64.sqrt();
        let c = butter_bandpass_sos(6, lo, hi, 48000.0).unwrap();
        assert_eq!(c.len(), 6);
        assert!(c.is_stable());
        let at = |f: f64| sosfreqz(&c, f, 48000.0).norm();
        assert!((at(1000.0) - 1.0).abs() < 1e-3);
        // -3 dB at both edges
        assert!((at(lo) - 0.5f64.sqrt()).abs() < 1e-3);
        assert!((at(hi) - 0.5f64.sqrt()).abs() < 1e-3);
        assert!(at(4000.0) < 1e-3);
        assert!(at(250.0) < 1e-3);
    }

    #[test]
    fn zeros_at_dc_and_nyquist() {
        let c = butter_bandpass_sos(4, 200.0, 400.0, 8000.0).unwrap();
        assert_eq!(c.len(), 4);
        assert!(sosfreqz(&c, 0.0, 8000.0).norm() < 1e-12);
        assert!(sosfreqz(&c, 4000.0, 8000.0).norm() < 1e-9);
    }

    #[test]
    fn odd_order_wide_band() {
        // Wide band: the odd prototype pole maps to two real digital poles
        let c = butter_bandpass_sos(3, 20.0, 20000.0, 48000.0).unwrap();
        assert_eq!(c.len(), 3);
        assert!(c.is_stable());
    }

    #[test]
    fn low_band_stays_stable() {
        let fc = 31.25;
        let c = butter_bandpass_sos(6, fc / 2f64.sqrt(), fc * 2f64.sqrt(), 48000.0).unwrap();
        assert!(c.is_stable());
        assert!((sosfreqz(&c, fc, 48000.0).norm() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_bad_edges() {
        assert!(matches!(
            butter_bandpass_sos(6, 1000.0, 500.0, 48000.0),
            Err(DspError::InvalidBand { .. })
        ));
        assert!(matches!(
            butter_bandpass_sos(6, 1000.0, 24000.0, 48000.0),
            Err(DspError::InvalidBand { .. })
        ));
        assert!(butter_bandpass_sos(0, 100.0, 200.0, 48000.0).is_err());
    }
}
