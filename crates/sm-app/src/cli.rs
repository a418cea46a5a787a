use std::path::PathBuf;

use clap::Parser;

/// sonometer — niveaux pondérés A et bandes d'octave sur un flux d'échantillons.
///
/// Lit un échantillon (pression, Pa) par ligne depuis un fichier ou stdin.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier d'échantillons, un par ligne. Défaut : stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Fréquence d'échantillonnage du flux (Hz). Remplace la config.
    #[arg(short = 'r', long)]
    pub sample_rate: Option<f64>,

    /// Taille de chunk en échantillons. Remplace la config.
    #[arg(long)]
    pub chunk: Option<usize>,

    /// Pondération temporelle : fast, slow, linear.
    #[arg(long)]
    pub integration: Option<String>,

    /// Afficher les niveaux par bande d'octave.
    #[arg(long, default_value_t = false)]
    pub bands: bool,

    /// Ne pas calculer les bandes d'octave.
    #[arg(long, default_value_t = false, conflicts_with = "bands")]
    pub no_bands: bool,

    /// Calculer les bandes sur plusieurs threads.
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Fichier de calibration du micro (.toml ou .json).
    #[arg(long)]
    pub calibration: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/meter.toml.
    #[arg(short, long, default_value = "config/meter.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
