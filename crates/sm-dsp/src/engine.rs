use sm_core::config::{Integration, MeterConfig};
use sm_core::traits::{ChunkFilter, StreamState};

use crate::bank::BandFilterBank;
use crate::compensation::{CalibrationFile, CompensationProfile, load_compensation};
use crate::design::{BandLayout, TimeConstant, a_weighting_coeff, envelope_coeff_for};
use crate::error::{DspResult, check_sample_rate};
use crate::lfilter::DirectFormFilter;

/// Moteur de filtrage en streaming d'un sonomètre.
///
/// Possède un état par filtre (pondération A, compensation, enveloppes fast
/// et slow, une cascade par bande). Chaque appel consomme un chunk, rend un
/// chunk de même longueur et met l'état à jour : enchaîner les chunks d'un
/// flux équivaut à filtrer le flux entier d'un bloc.
///
/// # Example
/// ```
/// use sm_core::config::Integration;
/// use sm_dsp::compensation::CompensationProfile;
/// use sm_dsp::engine::FilterEngine;
///
/// let comp = CompensationProfile::pass_through(48000.0, "none");
/// let mut engine = FilterEngine::new(48000.0, comp).unwrap();
/// let chunk = vec![0.1; 480];
/// let weighted = engine.apply_weighting(&chunk);
/// let envelope = engine.apply_envelope(&weighted, Integration::Fast);
/// assert_eq!(envelope.len(), 480);
/// assert!(engine.is_streaming());
/// ```
#[derive(Clone, Debug)]
pub struct FilterEngine {
    sample_rate: f64,
    weighting: DirectFormFilter,
    compensation: DirectFormFilter,
    profile: CompensationProfile,
    fast: DirectFormFilter,
    slow: DirectFormFilter,
    bank: BandFilterBank,
}

impl FilterEngine {
    /// Engine with the default octave layout.
    ///
    /// # Errors
    /// Any design error aborts construction.
    pub fn new(sr: f64, compensation: CompensationProfile) -> DspResult<Self> {
        Self::with_layout(sr, compensation, &BandLayout::octave())
    }

    /// Engine with a custom band layout.
    ///
    /// # Errors
    /// Any design error aborts construction.
    pub fn with_layout(
        sr: f64,
        compensation: CompensationProfile,
        layout: &BandLayout,
    ) -> DspResult<Self> {
        let sr = check_sample_rate(sr)?;
        let fast = envelope_coeff_for(TimeConstant::Fast, sr)?;
        let slow = envelope_coeff_for(TimeConstant::Slow, sr)?;
        let weighting = a_weighting_coeff(sr)?;
        let bank = BandFilterBank::design(sr, layout)?;
        log::info!(
            "Moteur prêt : {sr} Hz, {} bandes, compensation {:?}",
            bank.len(),
            compensation.status
        );
        Ok(Self {
            sample_rate: sr,
            weighting: DirectFormFilter::new(&weighting),
            compensation: DirectFormFilter::new(&compensation.coefficients),
            profile: compensation,
            fast: DirectFormFilter::new(&fast),
            slow: DirectFormFilter::new(&slow),
            bank,
        })
    }

    /// Engine from a meter configuration; the calibration file, if any, goes
    /// through [`load_compensation`] and never fails construction.
    ///
    /// # Errors
    /// Any design error aborts construction.
    pub fn from_config(config: &MeterConfig) -> DspResult<Self> {
        let sr = config.sample_rate;
        let profile = match &config.calibration_path {
            Some(path) => load_compensation(&CalibrationFile::new(path), sr),
            None => {
                log::info!("Aucune calibration configurée, compensation désactivée.");
                CompensationProfile::pass_through(sr, "aucune calibration configurée")
            }
        };
        Self::new(sr, profile)
    }

    /// Sample rate everything was designed for (Hz).
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Compensation in use and how it was obtained.
    #[must_use]
    pub fn compensation(&self) -> &CompensationProfile {
        &self.profile
    }

    /// The octave filter bank.
    #[must_use]
    pub fn bank(&self) -> &BandFilterBank {
        &self.bank
    }

    /// A-weighting of `chunk`.
    pub fn apply_weighting(&mut self, chunk: &[f64]) -> Vec<f64> {
        log::debug!("Applying A weighting ({} samples)", chunk.len());
        self.weighting.filter_chunk(chunk)
    }

    /// Energy envelope: square, integrate with the time constant's own state,
    /// take the absolute value. `Linear` returns the square and touches no state.
    pub fn apply_envelope(&mut self, chunk: &[f64], integration: Integration) -> Vec<f64> {
        let mut out: Vec<f64> = chunk.iter().map(|x| x * x).collect();
        let filter = match integration {
            Integration::Fast => &mut self.fast,
            Integration::Slow => &mut self.slow,
            Integration::Linear => {
                log::debug!("Calculating energy envelope using linear integration.");
                return out;
            }
        };
        log::debug!("Calculating energy envelope using {integration} integration.");
        filter.process_in_place(&mut out);
        for v in &mut out {
            *v = v.abs();
        }
        out
    }

    /// Microphone frequency-response compensation of `chunk`.
    pub fn apply_compensation(&mut self, chunk: &[f64]) -> Vec<f64> {
        log::debug!("Compensating microphone frequency response.");
        self.compensation.filter_chunk(chunk)
    }

    /// One filtered chunk per band, in increasing center frequency.
    pub fn apply_octave_bands(&mut self, chunk: &[f64]) -> Vec<Vec<f64>> {
        log::debug!("Applying octave band filters.");
        self.bank.process(chunk)
    }

    /// [`FilterEngine::apply_octave_bands`] on the rayon pool, bit-identical.
    pub fn apply_octave_bands_parallel(&mut self, chunk: &[f64]) -> Vec<Vec<f64>> {
        log::debug!("Applying octave band filters (parallel).");
        self.bank.process_parallel(chunk)
    }

    /// Zero every filter state (stream restart).
    pub fn reset(&mut self) {
        self.weighting.reset();
        self.compensation.reset();
        self.fast.reset();
        self.slow.reset();
        self.bank.reset();
        log::debug!("Engine state reset");
    }

    /// `true` once any filter has processed a sample since construction or reset.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        [
            self.weighting.stream_state(),
            self.compensation.stream_state(),
            self.fast.stream_state(),
            self.slow.stream_state(),
            self.bank.stream_state(),
        ]
        .contains(&StreamState::Streaming)
    }

    /// State of the envelope filter behind `integration` (`None` for `Linear`).
    #[must_use]
    pub fn envelope_state(&self, integration: Integration) -> Option<StreamState> {
        match integration {
            Integration::Fast => Some(self.fast.stream_state()),
            Integration::Slow => Some(self.slow.stream_state()),
            Integration::Linear => None,
        }
    }
}
