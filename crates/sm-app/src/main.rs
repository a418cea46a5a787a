use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use sm_core::config::{Integration, MeterConfig};
use sm_dsp::engine::FilterEngine;

pub mod cli;
pub mod meter;
pub mod pipeline;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config puis appliquer les overrides CLI
    let config = apply_overrides(resolve_config(&cli)?, &cli)?;

    // 4. Concevoir les filtres (échec de conception = arrêt)
    let engine = FilterEngine::from_config(&config).context("Conception des filtres impossible")?;

    // 5. Thread lecteur → canal borné
    let (reader, rx) = pipeline::spawn_reader(cli.input.as_deref(), config.chunk_size)?;

    // 6. Boucle de traitement
    let mut meter = meter::Meter::new(engine, &config, cli.parallel);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for chunk in rx.iter() {
        let report = meter.process(&chunk);
        if writeln!(out, "{report}").is_err() {
            // stdout fermé (pipe) : arrêt propre
            break;
        }
    }
    drop(rx);

    let samples = reader
        .join()
        .map_err(|_| anyhow::anyhow!("Le thread lecteur a paniqué"))??;
    log::info!("{samples} échantillons traités");
    let _ = writeln!(out, "{}", meter::summary(meter.stats(), meter.integration()));
    Ok(())
}

/// Config file if present, defaults otherwise.
fn resolve_config(cli: &cli::Cli) -> Result<MeterConfig> {
    if cli.config.exists() {
        sm_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(MeterConfig::default())
    }
}

/// CLI flags take precedence over the file.
fn apply_overrides(mut config: MeterConfig, cli: &cli::Cli) -> Result<MeterConfig> {
    if let Some(sr) = cli.sample_rate {
        config.sample_rate = sr;
    }
    if let Some(n) = cli.chunk {
        config.chunk_size = n;
    }
    if let Some(ref name) = cli.integration {
        config.integration = Integration::from_selector(name);
    }
    if cli.bands {
        config.octave_bands = true;
    }
    if cli.no_bands {
        config.octave_bands = false;
    }
    if let Some(ref path) = cli.calibration {
        config.calibration_path = Some(path.clone());
    }
    config.clamp_all();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> cli::Cli {
        cli::Cli::try_parse_from(std::iter::once("sonometer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[meter]\nsample_rate = 44100.0\nchunk_size = 100\nintegration = \"slow\""
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();
        let cli = parse(&[
            "--config",
            &path,
            "--chunk",
            "441",
            "--integration",
            "FAST",
            "--no-bands",
        ]);
        let config = apply_overrides(resolve_config(&cli).unwrap(), &cli).unwrap();
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.chunk_size, 441);
        assert_eq!(config.integration, Integration::Fast);
        assert!(!config.octave_bands);
    }

    #[test]
    fn missing_config_uses_defaults() {
        let cli = parse(&["--config", "/nonexistent/meter.toml", "--calibration", "mic.toml"]);
        let config = apply_overrides(resolve_config(&cli).unwrap(), &cli).unwrap();
        assert_eq!(config.sample_rate, MeterConfig::default().sample_rate);
        assert_eq!(config.calibration_path, Some(PathBuf::from("mic.toml")));
    }

    #[test]
    fn invalid_sample_rate_rejected() {
        let cli = parse(&["--config", "/nonexistent/meter.toml", "--sample-rate", "0"]);
        assert!(apply_overrides(resolve_config(&cli).unwrap(), &cli).is_err());
    }
}
