use serde::{Deserialize, Serialize};
use sm_core::coeffs::Cascade;

use super::butterworth::butter_bandpass_sos;
use crate::error::{DspResult, check_sample_rate};

/// Ordre Butterworth des filtres de bande.
pub const BAND_ORDER: usize = 6;

/// Fraction of Nyquist an upper edge is clipped to when it would reach it.
pub const EDGE_CLIP_RATIO: f64 = 0.98;

/// Géométrie d'un banc de bandes : `f_c[i] = reference · ratio^i` pour
/// `i ∈ [first_index, last_index]`, bords à `f_c · ratio^(∓1/2)`.
///
/// # Example
/// ```
/// use sm_dsp::design::BandLayout;
/// let centers = BandLayout::octave().centers();
/// assert_eq!(centers.len(), 10);
/// assert_eq!(centers[0], 31.25);
/// assert_eq!(centers[9], 16000.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandLayout {
    /// Ratio between adjacent centers (2 for octaves).
    pub ratio: f64,
    /// Center of band index 0 (Hz).
    pub reference: f64,
    /// First band index (inclusive).
    pub first_index: i32,
    /// Last band index (inclusive).
    pub last_index: i32,
}

impl Default for BandLayout {
    fn default() -> Self {
        Self::octave()
    }
}

impl BandLayout {
    /// Ten octave bands centered on 1 kHz, 31.25 Hz … 16 kHz.
    #[must_use]
    pub fn octave() -> Self {
        Self {
            ratio: 2.0,
            reference: 1000.0,
            first_index: -5,
            last_index: 4,
        }
    }

    /// Nominal centers in increasing order, before any Nyquist policy.
    #[must_use]
    pub fn centers(&self) -> Vec<f64> {
        (self.first_index..=self.last_index)
            .map(|i| self.reference * self.ratio.powi(i))
            .collect()
    }

    /// Nominal `(low, high)` edges around `center`.
    #[must_use]
    pub fn edges(&self, center: f64) -> (f64, f64) {
        let half = self.ratio.sqrt();
        (center / half, center * half)
    }
}

/// One designed band of the bank.
#[derive(Clone, Debug, PartialEq)]
pub struct OctaveBand {
    /// Center frequency (Hz).
    pub center: f64,
    /// Lower -3 dB edge (Hz).
    pub low: f64,
    /// Upper -3 dB edge (Hz), possibly clipped below Nyquist.
    pub high: f64,
    /// Bandpass realization.
    pub cascade: Cascade,
}

/// Conçoit le banc de bandes pour `sr`.
///
/// Une bande dont le centre atteint `sr/2` est abandonnée; une bande dont le
/// bord haut atteint `sr/2` voit ce bord ramené à `0.98 · sr/2`, sauf si ce
/// bord ne dépasse plus le centre : la bande est alors abandonnée aussi. Chaque
/// cas est journalisé en `warn`. Toute bande retenue vérifie
/// `low < center < high < sr/2`.
///
/// # Errors
/// Propagates [`crate::error::DspError`] from the Butterworth designer.
///
/// # Example
/// ```
/// use sm_dsp::design::{BandLayout, bands_coeff};
/// let bands = bands_coeff(48000.0, &BandLayout::octave()).unwrap();
/// assert_eq!(bands.len(), 10);
/// assert!(bands.iter().all(|b| b.cascade.len() == 6));
/// ```
pub fn bands_coeff(sr: f64, layout: &BandLayout) -> DspResult<Vec<OctaveBand>> {
    let sr = check_sample_rate(sr)?;
    let nyquist = sr / 2.0;
    log::info!("Calculating coefficients of octave bands ({sr} Hz)");

    let mut bands = Vec::with_capacity(layout.centers().len());
    for center in layout.centers() {
        if center >= nyquist {
            log::warn!("Bande {center} Hz au-delà de Nyquist ({nyquist} Hz), ignorée");
            continue;
        }
        let (low, mut high) = layout.edges(center);
        if high >= nyquist {
            let clipped = EDGE_CLIP_RATIO * nyquist;
            if clipped <= center {
                log::warn!("Bande {center} Hz : bord haut ramené sous le centre, ignorée");
                continue;
            }
            log::warn!("Bande {center} Hz : bord haut {high:.1} Hz ramené à {clipped:.1} Hz");
            high = clipped;
        }
        let cascade = butter_bandpass_sos(BAND_ORDER, low, high, sr)?;
        bands.push(OctaveBand {
            center,
            low,
            high,
            cascade,
        });
    }
    log::debug!("{} bandes conçues", bands.len());
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::sosfreqz;

    #[test]
    fn ten_bands_at_48k() {
        let bands = bands_coeff(48000.0, &BandLayout::octave()).unwrap();
        assert_eq!(bands.len(), 10);
        for w in bands.windows(2) {
            assert!(w[0].center < w[1].center);
        }
        for b in &bands {
            assert!(b.low < b.center && b.center < b.high && b.high < 24000.0);
            assert!(b.cascade.is_stable());
            assert!((sosfreqz(&b.cascade, b.center, 48000.0).norm() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn top_edge_clipped_at_44k1() {
        let bands = bands_coeff(44100.0, &BandLayout::octave()).unwrap();
        assert_eq!(bands.len(), 10);
        let top = &bands[9];
        assert_eq!(top.center, 16000.0);
        assert!((top.high - 0.98 * 22050.0).abs() < 1e-9);
    }

    #[test]
    fn bands_above_nyquist_dropped() {
        let bands = bands_coeff(16000.0, &BandLayout::octave()).unwrap();
        // 8 kHz and 16 kHz centers reach Nyquist
        assert_eq!(bands.len(), 8);
        assert_eq!(bands.last().unwrap().center, 4000.0);
        assert!(bands.iter().all(|b| b.high < 8000.0));
    }

    #[test]
    fn band_dropped_when_clipped_edge_falls_below_center() {
        // 0.98 · 16325 = 15998.5 < 16000
        let bands = bands_coeff(32650.0, &BandLayout::octave()).unwrap();
        assert_eq!(bands.len(), 9);
        assert_eq!(bands.last().unwrap().center, 8000.0);
        for sr in [32650.0, 63.7, 44100.0, 32000.0] {
            for b in bands_coeff(sr, &BandLayout::octave()).unwrap() {
                assert!(b.low < b.center && b.center < b.high && b.high < sr / 2.0, "{sr}");
            }
        }
        assert!(bands_coeff(63.7, &BandLayout::octave()).unwrap().is_empty());
    }

    #[test]
    fn third_octave_layout() {
        let layout = BandLayout {
            ratio: 2f64.powf(1.0 / 3.0),
            reference: 1000.0,
            first_index: -3,
            last_index: 3,
        };
        let bands = bands_coeff(48000.0, &layout).unwrap();
        assert_eq!(bands.len(), 7);
        assert!((bands[3].center - 1000.0).abs() < 1e-9);
    }
}
