use sm_core::CoreError;
use thiserror::Error;

/// Result alias for filter design and calibration loading.
pub type DspResult<T> = Result<T, DspError>;

/// Errors originating from the DSP module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    /// Envelope selector other than `fast` / `slow`.
    #[error("Constante de temps inconnue : '{0}' (attendu 'fast' ou 'slow')")]
    InvalidTimeConstant(String),

    /// Sample rate zero, negative or non-finite.
    #[error("Fréquence d'échantillonnage invalide : {0}")]
    InvalidSampleRate(f64),

    /// A design step produced non-finite coefficients or an unstable section.
    #[error("Instabilité numérique pendant {stage} : {detail}")]
    NumericInstability {
        /// Design step that failed.
        stage: &'static str,
        /// What was observed.
        detail: String,
    },

    /// Band edges outside `(0, sr/2)` or not ordered.
    #[error("Bande invalide [{low} Hz, {high} Hz] pour Nyquist = {nyquist} Hz")]
    InvalidBand {
        /// Lower edge (Hz).
        low: f64,
        /// Upper edge (Hz).
        high: f64,
        /// Half the sample rate (Hz).
        nyquist: f64,
    },

    /// Coefficient set rejected by the core type.
    #[error(transparent)]
    InvalidCoefficients(#[from] CoreError),

    /// Calibration artifact missing or corrupt.
    #[error("Coefficients de compensation indisponibles : {0}")]
    CalibrationUnavailable(String),

    /// Calibration designed at another sample rate.
    #[error("Fréquence de référence ({found} Hz) et de mesure ({expected} Hz) différentes")]
    SampleRateMismatch {
        /// Runtime sample rate.
        expected: f64,
        /// Sample rate stored with the calibration.
        found: f64,
    },
}

/// Reject `sr <= 0` and non-finite rates.
///
/// # Errors
/// Returns [`DspError::InvalidSampleRate`].
pub fn check_sample_rate(sr: f64) -> DspResult<f64> {
    if sr.is_finite() && sr > 0.0 {
        Ok(sr)
    } else {
        Err(DspError::InvalidSampleRate(sr))
    }
}

/// Fail with [`DspError::NumericInstability`] if any value is non-finite.
///
/// # Errors
/// Returns [`DspError::NumericInstability`] tagged with `stage`.
pub fn ensure_finite(stage: &'static str, values: &[f64]) -> DspResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        None => Ok(()),
        Some(i) => Err(DspError::NumericInstability {
            stage,
            detail: format!("coefficient {i} = {}", values[i]),
        }),
    }
}
