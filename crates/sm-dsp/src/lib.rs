// Filter design, streaming filters, calibration loading and level conversion for sonometer.

pub mod bank;
pub mod compensation;
pub mod design;
pub mod engine;
pub mod error;
pub mod lfilter;
pub mod levels;
pub mod response;
pub mod sos;

pub use bank::BandFilterBank;
pub use compensation::{CalibrationStatus, CompensationProfile, load_compensation};
pub use engine::FilterEngine;
pub use error::{DspError, DspResult};
