use rayon::prelude::*;
use sm_core::traits::{ChunkFilter, StreamState};

use crate::design::{BandLayout, OctaveBand, bands_coeff};
use crate::error::DspResult;
use crate::sos::SosFilter;

/// One band with its own streaming state.
#[derive(Clone, Debug)]
struct BandChannel {
    band: OctaveBand,
    filter: SosFilter,
}

/// Banc de filtres passe-bande, un état par bande, ordre croissant des centres.
///
/// Chaque bande filtre la même entrée indépendamment; les états étant
/// disjoints, [`BandFilterBank::process_parallel`] répartit les bandes sur les
/// workers rayon avec un résultat identique au bit près à
/// [`BandFilterBank::process`].
///
/// # Example
/// ```
/// use sm_dsp::bank::BandFilterBank;
/// use sm_dsp::design::BandLayout;
/// let mut bank = BandFilterBank::design(48000.0, &BandLayout::octave()).unwrap();
/// let out = bank.process(&[0.0; 480]);
/// assert_eq!(out.len(), 10);
/// assert!(out.iter().all(|band| band.len() == 480));
/// ```
#[derive(Clone, Debug)]
pub struct BandFilterBank {
    channels: Vec<BandChannel>,
}

impl BandFilterBank {
    /// Bank over already designed bands, states zeroed.
    #[must_use]
    pub fn new(bands: Vec<OctaveBand>) -> Self {
        let channels = bands
            .into_iter()
            .map(|band| BandChannel {
                filter: SosFilter::new(&band.cascade),
                band,
            })
            .collect();
        Self { channels }
    }

    /// Design every band of `layout` for `sr`.
    ///
    /// # Errors
    /// Propagates design errors.
    pub fn design(sr: f64, layout: &BandLayout) -> DspResult<Self> {
        Ok(Self::new(bands_coeff(sr, layout)?))
    }

    /// Number of bands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// `true` when every band was dropped (very low sample rates).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Band descriptions in order.
    pub fn bands(&self) -> impl Iterator<Item = &OctaveBand> {
        self.channels.iter().map(|c| &c.band)
    }

    /// Center frequencies in order (Hz).
    #[must_use]
    pub fn centers(&self) -> Vec<f64> {
        self.bands().map(|b| b.center).collect()
    }

    /// Filter `chunk` through every band, one output per band.
    pub fn process(&mut self, chunk: &[f64]) -> Vec<Vec<f64>> {
        self.channels
            .iter_mut()
            .map(|c| c.filter.filter_chunk(chunk))
            .collect()
    }

    /// Same as [`BandFilterBank::process`], bands computed on the rayon pool.
    pub fn process_parallel(&mut self, chunk: &[f64]) -> Vec<Vec<f64>> {
        self.channels
            .par_iter_mut()
            .map(|c| c.filter.filter_chunk(chunk))
            .collect()
    }

    /// Zero every band state.
    pub fn reset(&mut self) {
        for c in &mut self.channels {
            c.filter.reset();
        }
    }

    /// `Streaming` once any band has processed samples.
    #[must_use]
    pub fn stream_state(&self) -> StreamState {
        if self
            .channels
            .iter()
            .any(|c| c.filter.stream_state() == StreamState::Streaming)
        {
            StreamState::Streaming
        } else {
            StreamState::Idle
        }
    }
}
