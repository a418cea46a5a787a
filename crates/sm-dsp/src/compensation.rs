use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sm_core::coeffs::FilterCoefficients;

use crate::error::DspError;

/// Coefficients de compensation persistés avec leur fréquence de conception.
///
/// Format fichier (TOML) :
/// ```toml
/// b = [0.98, -0.97]
/// a = [1.0, -0.99]
/// sample_rate = 48000.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    /// Numerator.
    pub b: Vec<f64>,
    /// Denominator.
    pub a: Vec<f64>,
    /// Sample rate the filter was designed for (Hz).
    pub sample_rate: f64,
}

/// Where a calibration artifact comes from.
pub trait CalibrationSource {
    /// Retrieve the artifact.
    ///
    /// # Errors
    /// Any retrieval or decoding failure; the loader treats all of them as
    /// "unavailable".
    fn fetch(&self) -> Result<CalibrationData>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

impl CalibrationSource for CalibrationData {
    fn fetch(&self) -> Result<CalibrationData> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "mémoire".into()
    }
}

/// Fichier de calibration TOML (`.toml`) ou JSON (`.json`).
#[derive(Clone, Debug)]
pub struct CalibrationFile {
    path: PathBuf,
}

impl CalibrationFile {
    /// Source reading `path` on every fetch.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Clone, Copy)]
enum Format {
    Toml,
    Json,
}

fn format_of(path: &Path) -> Result<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(e) if e.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
        Some(e) if e.eq_ignore_ascii_case("json") => Ok(Format::Json),
        _ => bail!("Extension non supportée : {} (attendu .toml ou .json)", path.display()),
    }
}

impl CalibrationSource for CalibrationFile {
    fn fetch(&self) -> Result<CalibrationData> {
        let format = format_of(&self.path)?;
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Impossible de lire {}", self.path.display()))?;
        let data = match format {
            Format::Toml => toml::from_str(&content)
                .with_context(|| format!("Erreur de parsing TOML dans {}", self.path.display()))?,
            Format::Json => serde_json::from_str(&content)
                .with_context(|| format!("Erreur de parsing JSON dans {}", self.path.display()))?,
        };
        Ok(data)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Écrit un fichier de calibration au format déduit de l'extension.
///
/// # Errors
/// Unsupported extension, serialization or I/O failure.
pub fn save_calibration(path: &Path, data: &CalibrationData) -> Result<()> {
    let content = match format_of(path)? {
        Format::Toml => toml::to_string_pretty(data).context("Sérialisation TOML")?,
        Format::Json => serde_json::to_string_pretty(data).context("Sérialisation JSON")?,
    };
    std::fs::write(path, content)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    log::info!("Calibration écrite dans {}", path.display());
    Ok(())
}

/// What the loader ended up doing.
#[derive(Clone, Debug, PartialEq)]
pub enum CalibrationStatus {
    /// Artifact loaded, sample rates agree.
    Loaded,
    /// Artifact loaded but designed for another rate; used anyway.
    SampleRateMismatch {
        /// Runtime sample rate.
        expected: f64,
        /// Rate stored in the artifact.
        found: f64,
    },
    /// Pass-through in use.
    Fallback {
        /// Why the artifact was not used.
        reason: String,
    },
}

/// Compensation filter ready for the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct CompensationProfile {
    /// Coefficients applied by the engine.
    pub coefficients: FilterCoefficients,
    /// Design sample rate (runtime rate for the pass-through).
    pub sample_rate: f64,
    /// Outcome of loading.
    pub status: CalibrationStatus,
}

impl CompensationProfile {
    /// `b = [1, 0]`, `a = [1]`: no compensation.
    #[must_use]
    pub fn pass_through(sr: f64, reason: impl Into<String>) -> Self {
        Self {
            coefficients: FilterCoefficients::identity(),
            sample_rate: sr,
            status: CalibrationStatus::Fallback {
                reason: reason.into(),
            },
        }
    }

    /// `true` unless the pass-through is in use.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !matches!(self.status, CalibrationStatus::Fallback { .. })
    }
}

/// Charge la compensation du micro; ne retourne jamais d'erreur.
///
/// Toute erreur de récupération ou de validation donne le filtre identité
/// (journalisé en `warn`). Une fréquence de conception différente de `sr` est
/// journalisée en `error` et les coefficients sont utilisés quand même.
///
/// # Example
/// ```
/// use sm_dsp::compensation::{CalibrationFile, CalibrationStatus, load_compensation};
/// let profile = load_compensation(&CalibrationFile::new("/nonexistent/mic.toml"), 48000.0);
/// assert_eq!(profile.coefficients.b(), &[1.0, 0.0]);
/// assert_eq!(profile.coefficients.a(), &[1.0]);
/// assert!(matches!(profile.status, CalibrationStatus::Fallback { .. }));
/// ```
pub fn load_compensation(source: &dyn CalibrationSource, sr: f64) -> CompensationProfile {
    log::info!("Loading compensation filter coefficients from {}", source.describe());
    match try_load(source) {
        Ok((coefficients, found)) => {
            log::info!("Length of numerator coefficients: {}", coefficients.b().len());
            log::info!("Length of denominator coefficients: {}", coefficients.a().len());
            let status = if found == sr {
                CalibrationStatus::Loaded
            } else {
                log::error!("{}", DspError::SampleRateMismatch { expected: sr, found });
                CalibrationStatus::SampleRateMismatch { expected: sr, found }
            };
            CompensationProfile {
                coefficients,
                sample_rate: found,
                status,
            }
        }
        Err(e) => {
            log::warn!("{e}. Filtre identité utilisé (b = [1, 0], a = [1]).");
            CompensationProfile::pass_through(sr, e.to_string())
        }
    }
}

fn try_load(source: &dyn CalibrationSource) -> Result<(FilterCoefficients, f64), DspError> {
    let data = source
        .fetch()
        .map_err(|e| DspError::CalibrationUnavailable(format!("{e:#}")))?;
    let coefficients = FilterCoefficients::new(data.b, data.a)
        .map_err(|e| DspError::CalibrationUnavailable(e.to_string()))?;
    Ok((coefficients, data.sample_rate))
}
