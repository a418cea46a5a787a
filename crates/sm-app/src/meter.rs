use std::fmt;

use sm_core::config::{Integration, MeterConfig};
use sm_dsp::engine::FilterEngine;
use sm_dsp::levels::{LevelStats, leq, mean_square};

/// Niveaux d'un chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkReport {
    /// Index of the chunk in the stream (from 0).
    pub index: u64,
    /// A-weighted equivalent level of the chunk (dB).
    pub laeq: f64,
    /// Time-weighted A level at the end of the chunk (dB), `None` for linear integration.
    pub la_time: Option<f64>,
    /// `(center Hz, Leq dB)` per band, empty unless bands are enabled.
    pub bands: Vec<(f64, f64)>,
}

impl fmt::Display for ChunkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}  LAeq {:>7.2} dB", self.index, self.laeq)?;
        if let Some(l) = self.la_time {
            write!(f, "  LA {l:>7.2} dB")?;
        }
        for (center, level) in &self.bands {
            write!(f, "  {center:.0}Hz {level:.1}")?;
        }
        Ok(())
    }
}

/// Chaîne de mesure complète : compensation → pondération A → enveloppe,
/// et bandes d'octave sur le signal compensé.
pub struct Meter {
    engine: FilterEngine,
    integration: Integration,
    bands: bool,
    parallel: bool,
    p_ref: f64,
    offset_db: f64,
    stats: LevelStats,
    next_index: u64,
}

impl Meter {
    /// Wrap an engine with the level settings of `config`.
    #[must_use]
    pub fn new(engine: FilterEngine, config: &MeterConfig, parallel: bool) -> Self {
        Self {
            engine,
            integration: config.integration,
            bands: config.octave_bands,
            parallel,
            p_ref: config.reference_pressure,
            offset_db: config.sensitivity_db,
            stats: LevelStats::new(config.reference_pressure, config.sensitivity_db),
            next_index: 0,
        }
    }

    /// Run one chunk through the chain.
    pub fn process(&mut self, chunk: &[f64]) -> ChunkReport {
        let compensated = self.engine.apply_compensation(chunk);
        let weighted = self.engine.apply_weighting(&compensated);

        let squared = self.engine.apply_envelope(&weighted, Integration::Linear);
        self.stats.push_energy(&squared);
        let laeq = self.level(mean_square(&weighted));

        let la_time = match self.integration {
            Integration::Linear => None,
            tc => {
                let env = self.engine.apply_envelope(&weighted, tc);
                env.last().map(|&ms| self.level(ms))
            }
        };
        if let Some(l) = la_time {
            self.stats.push_level(l);
        }

        let bands = if self.bands {
            let outputs = if self.parallel {
                self.engine.apply_octave_bands_parallel(&compensated)
            } else {
                self.engine.apply_octave_bands(&compensated)
            };
            self.engine
                .bank()
                .centers()
                .into_iter()
                .zip(outputs.iter().map(|b| leq(b, self.p_ref) + self.offset_db))
                .collect()
        } else {
            Vec::new()
        };

        let index = self.next_index;
        self.next_index += 1;
        ChunkReport {
            index,
            laeq,
            la_time,
            bands,
        }
    }

    fn level(&self, ms: f64) -> f64 {
        self.stats.to_db(ms)
    }

    /// Stream totals.
    #[must_use]
    pub fn stats(&self) -> &LevelStats {
        &self.stats
    }

    /// Time weighting in use.
    #[must_use]
    pub fn integration(&self) -> Integration {
        self.integration
    }
}

/// One-line summary of a finished stream.
#[must_use]
pub fn summary(stats: &LevelStats, integration: Integration) -> String {
    let fmt_db = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |l| format!("{l:.2} dB"));
    format!(
        "LAeq {}  LAmax({integration}) {}  LAmin({integration}) {}",
        fmt_db(stats.leq()),
        fmt_db(stats.lmax()),
        fmt_db(stats.lmin())
    )
}
