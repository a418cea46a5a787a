use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Configuration complète du sonomètre.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use sm_core::config::MeterConfig;
/// let config = MeterConfig::default();
/// assert_eq!(config.sample_rate, 48000.0);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct MeterConfig {
    // === Flux ===
    /// Fréquence d'échantillonnage déclarée du flux d'entrée (Hz).
    pub sample_rate: f64,
    /// Taille de chunk utilisée par le lecteur du binaire.
    pub chunk_size: usize,

    // === Pondérations ===
    /// Pondération temporelle de l'enveloppe.
    pub integration: Integration,
    /// Calculer aussi les bandes d'octave.
    pub octave_bands: bool,

    // === Calibration ===
    /// Fichier de coefficients de compensation du micro. None = pas de compensation.
    pub calibration_path: Option<PathBuf>,

    // === Niveaux ===
    /// Pression de référence (Pa) pour la conversion en dB.
    pub reference_pressure: f64,
    /// Offset de sensibilité ajouté à chaque niveau (dB).
    pub sensitivity_db: f64,
}

/// Energy-envelope integration mode.
///
/// `Fast` and `Slow` are the sound-level-meter time constants (0.125 s and
/// 1 s); anything else is instantaneous (`Linear`): the squared signal is used
/// as is.
///
/// # Example
/// ```
/// use sm_core::config::Integration;
/// assert_eq!(Integration::from("fast"), Integration::Fast);
/// assert_eq!(Integration::from(" SLOW "), Integration::Slow);
/// assert_eq!(Integration::from("impulse"), Integration::Linear);
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Integration {
    /// τ = 125 ms.
    #[default]
    Fast,
    /// τ = 1 s.
    Slow,
    /// No time weighting.
    Linear,
}

impl From<&str> for Integration {
    fn from(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "fast" => Self::Fast,
            "slow" => Self::Slow,
            _ => Self::Linear,
        }
    }
}

impl Integration {
    /// Like `From<&str>`, but warns when an unknown selector falls back to `Linear`.
    #[must_use]
    pub fn from_selector(selector: &str) -> Self {
        let integration = Self::from(selector);
        if integration == Self::Linear && !selector.trim().eq_ignore_ascii_case("linear") {
            log::warn!("Intégration inconnue '{selector}', intégration linéaire utilisée.");
        }
        integration
    }
}

impl std::fmt::Display for Integration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Fast => "fast",
            Self::Slow => "slow",
            Self::Linear => "linear",
        };
        f.write_str(name)
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            chunk_size: 4800,
            integration: Integration::Fast,
            octave_bands: true,
            calibration_path: None,
            reference_pressure: 20e-6,
            sensitivity_db: 0.0,
        }
    }
}

impl MeterConfig {
    /// Clamp numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.chunk_size = self.chunk_size.clamp(1, 1 << 20);
        self.sensitivity_db = self.sensitivity_db.clamp(-100.0, 100.0);
    }

    /// Reject values that cannot be clamped into something meaningful.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for a non-positive or non-finite sample
    /// rate or reference pressure.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(CoreError::Config(format!(
                "sample_rate doit être > 0, reçu {}",
                self.sample_rate
            )));
        }
        if !(self.reference_pressure.is_finite() && self.reference_pressure > 0.0) {
            return Err(CoreError::Config(format!(
                "reference_pressure doit être > 0, reçu {}",
                self.reference_pressure
            )));
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    meter: Option<MeterSection>,
    calibration: Option<CalibrationSection>,
    levels: Option<LevelsSection>,
}

/// Meter section, all fields optional for partial override.
#[derive(Deserialize)]
struct MeterSection {
    sample_rate: Option<f64>,
    chunk_size: Option<usize>,
    integration: Option<String>,
    octave_bands: Option<bool>,
}

#[derive(Deserialize)]
struct CalibrationSection {
    path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct LevelsSection {
    reference_pressure: Option<f64>,
    sensitivity_db: Option<f64>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// Un chemin de calibration relatif est résolu par rapport au dossier du
/// fichier de configuration.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or holds invalid values.
///
/// # Example
/// ```no_run
/// use sm_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/meter.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<MeterConfig> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let mut config = MeterConfig::default();

    if let Some(m) = file.meter {
        if let Some(v) = m.sample_rate {
            config.sample_rate = v;
        }
        if let Some(v) = m.chunk_size {
            config.chunk_size = v;
        }
        if let Some(v) = m.integration {
            config.integration = Integration::from_selector(&v);
        }
        if let Some(v) = m.octave_bands {
            config.octave_bands = v;
        }
    }

    if let Some(c) = file.calibration {
        config.calibration_path = c.path.map(|p| {
            if p.is_relative() {
                path.parent().map_or_else(|| p.clone(), |dir| dir.join(&p))
            } else {
                p
            }
        });
    }

    if let Some(l) = file.levels {
        if let Some(v) = l.reference_pressure {
            config.reference_pressure = v;
        }
        if let Some(v) = l.sensitivity_db {
            config.sensitivity_db = v;
        }
    }

    config.clamp_all();
    config.validate()?;
    log::info!("Config chargée depuis {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_config("[meter]\nsample_rate = 44100.0\nintegration = \"slow\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.integration, Integration::Slow);
        assert_eq!(config.chunk_size, MeterConfig::default().chunk_size);
        assert!(config.octave_bands);
        assert!(config.calibration_path.is_none());
    }

    #[test]
    fn empty_file_is_default() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config, MeterConfig::default());
    }

    #[test]
    fn relative_calibration_path_resolved_next_to_config() {
        let file = write_config("[calibration]\npath = \"mic.toml\"\n");
        let config = load_config(file.path()).unwrap();
        let dir = file.path().parent().unwrap();
        assert_eq!(config.calibration_path, Some(dir.join("mic.toml")));
    }

    #[test]
    fn missing_file_reported() {
        let err = load_config(Path::new("/nonexistent/meter.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::FileNotFound { .. })
        ));
    }

    #[test]
    fn rejects_bad_sample_rate() {
        let file = write_config("[meter]\nsample_rate = 0.0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn clamps_chunk_size() {
        let file = write_config("[meter]\nchunk_size = 0\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.chunk_size, 1);
    }

    #[test]
    fn unknown_integration_is_linear() {
        assert_eq!(Integration::from("impulse"), Integration::Linear);
        assert_eq!(Integration::from("linear").to_string(), "linear");
    }
}
