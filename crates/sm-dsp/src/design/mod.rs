//! Conception des filtres (fonctions pures, aucun état)
//! - Enveloppe énergétique fast / slow
//! - Pondération A (prototype analogique → z)
//! - Butterworth passe-bande en cascade SOS
//! - Banc de bandes d'octave

pub mod bands;
pub mod butterworth;
pub mod envelope;
pub mod weighting;

pub use bands::{BandLayout, OctaveBand, bands_coeff};
pub use butterworth::butter_bandpass_sos;
pub use envelope::{TimeConstant, envelope_coeff, envelope_coeff_for};
pub use weighting::a_weighting_coeff;
