use std::fmt;
use std::str::FromStr;

use sm_core::coeffs::FilterCoefficients;
use sm_core::config::Integration;

use crate::error::{DspError, DspResult, check_sample_rate};

/// Constante de temps normalisée d'un sonomètre.
///
/// # Example
/// ```
/// use sm_dsp::design::TimeConstant;
/// let tc: TimeConstant = "Fast".parse().unwrap();
/// assert_eq!(tc.seconds(), 0.125);
/// assert!("impulse".parse::<TimeConstant>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeConstant {
    /// 125 ms.
    Fast,
    /// 1 s.
    Slow,
}

impl TimeConstant {
    /// τ in seconds.
    #[must_use]
    pub fn seconds(self) -> f64 {
        match self {
            Self::Fast => 0.125,
            Self::Slow => 1.0,
        }
    }

    /// Time constant behind an integration mode, `None` for `Linear`.
    #[must_use]
    pub fn from_integration(integration: Integration) -> Option<Self> {
        match integration {
            Integration::Fast => Some(Self::Fast),
            Integration::Slow => Some(Self::Slow),
            Integration::Linear => None,
        }
    }
}

impl FromStr for TimeConstant {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "slow" => Ok(Self::Slow),
            _ => Err(DspError::InvalidTimeConstant(s.to_string())),
        }
    }
}

impl fmt::Display for TimeConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fast => "fast",
            Self::Slow => "slow",
        })
    }
}

/// Coefficients of the one-pole energy integrator for a named time constant.
///
/// `H(z) = z / ((1 + sr·τ) z − sr·τ)`, i.e. `b = [1, 0]`,
/// `a = [1 + sr·τ, −sr·τ]`.
///
/// # Errors
/// [`DspError::InvalidTimeConstant`] for a selector other than fast/slow,
/// [`DspError::InvalidSampleRate`] for `sr <= 0`.
///
/// # Example
/// ```
/// use sm_dsp::design::envelope_coeff;
/// let c = envelope_coeff("fast", 48000.0).unwrap();
/// assert_eq!(c.b(), &[1.0, 0.0]);
/// assert_eq!(c.a(), &[6001.0, -6000.0]);
/// ```
pub fn envelope_coeff(selector: &str, sr: f64) -> DspResult<FilterCoefficients> {
    envelope_coeff_for(selector.parse()?, sr)
}

/// Typed variant of [`envelope_coeff`].
///
/// # Errors
/// [`DspError::InvalidSampleRate`] for `sr <= 0` or non-finite.
pub fn envelope_coeff_for(tc: TimeConstant, sr: f64) -> DspResult<FilterCoefficients> {
    let sr = check_sample_rate(sr)?;
    log::info!("Calculating coefficients of temporal weighting ({tc}, {sr} Hz)");
    let k = sr * tc.seconds();
    Ok(FilterCoefficients::new(vec![1.0, 0.0], vec![1.0 + k, -k])?)
}
