//! Conversion énergie → décibels.

/// Plancher retourné pour une énergie nulle ou négative (dB).
pub const MIN_LEVEL_DB: f64 = -200.0;

/// Pression de référence acoustique dans l'air (Pa).
pub const REFERENCE_PRESSURE: f64 = 20e-6;

/// `10·log10(ms / p_ref²)`, floored at [`MIN_LEVEL_DB`].
///
/// # Example
/// ```
/// use sm_dsp::levels::{MIN_LEVEL_DB, level_db};
/// // 1 Pa RMS ≈ 94 dB SPL
/// assert!((level_db(1.0, 20e-6) - 93.98).abs() < 0.01);
/// assert_eq!(level_db(0.0, 20e-6), MIN_LEVEL_DB);
/// ```
#[must_use]
pub fn level_db(mean_square: f64, p_ref: f64) -> f64 {
    if !(mean_square.is_finite() && mean_square > 0.0) {
        return MIN_LEVEL_DB;
    }
    (10.0 * (mean_square / (p_ref * p_ref)).log10()).max(MIN_LEVEL_DB)
}

/// Mean of the squared samples.
#[must_use]
pub fn mean_square(chunk: &[f64]) -> f64 {
    if chunk.is_empty() {
        return 0.0;
    }
    chunk.iter().map(|x| x * x).sum::<f64>() / chunk.len() as f64
}

/// Equivalent continuous level of a pressure chunk (dB).
#[must_use]
pub fn leq(chunk: &[f64], p_ref: f64) -> f64 {
    level_db(mean_square(chunk), p_ref)
}

/// Running Lmax / Lmin / Leq over a stream.
///
/// Lmax and Lmin follow the time-weighted level pushed with
/// [`LevelStats::push_level`]; Leq integrates the raw energy of every sample
/// pushed with [`LevelStats::push_energy`].
#[derive(Clone, Debug)]
pub struct LevelStats {
    p_ref: f64,
    offset_db: f64,
    energy_sum: f64,
    samples: u64,
    max_db: f64,
    min_db: f64,
}

impl LevelStats {
    /// Empty statistics; `offset_db` is added to every reported level.
    #[must_use]
    pub fn new(p_ref: f64, offset_db: f64) -> Self {
        Self {
            p_ref,
            offset_db,
            energy_sum: 0.0,
            samples: 0,
            max_db: f64::NEG_INFINITY,
            min_db: f64::INFINITY,
        }
    }

    /// Level of a mean-square value with this meter's reference and offset.
    #[must_use]
    pub fn to_db(&self, mean_square: f64) -> f64 {
        level_db(mean_square, self.p_ref) + self.offset_db
    }

    /// Accumulate squared samples (e.g. the linear envelope of a chunk).
    pub fn push_energy(&mut self, squared: &[f64]) {
        self.energy_sum += squared.iter().sum::<f64>();
        self.samples += squared.len() as u64;
    }

    /// Track extremes of a time-weighted level (dB, offset already applied).
    pub fn push_level(&mut self, db: f64) {
        self.max_db = self.max_db.max(db);
        self.min_db = self.min_db.min(db);
    }

    /// Leq since creation or last reset, `None` before any sample.
    #[must_use]
    pub fn leq(&self) -> Option<f64> {
        (self.samples > 0).then(|| self.to_db(self.energy_sum / self.samples as f64))
    }

    /// Highest time-weighted level seen.
    #[must_use]
    pub fn lmax(&self) -> Option<f64> {
        self.max_db.is_finite().then_some(self.max_db)
    }

    /// Lowest time-weighted level seen.
    #[must_use]
    pub fn lmin(&self) -> Option<f64> {
        self.min_db.is_finite().then_some(self.min_db)
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::new(self.p_ref, self.offset_db);
    }
}
