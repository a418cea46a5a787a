/// Configuration, types, and shared structures for sonometer.
///
/// This crate contains the coefficient types, the streaming filter trait and
/// the configuration logic used across the sonometer workspace.

pub mod coeffs;
pub mod config;
pub mod error;
pub mod traits;

pub use coeffs::{Cascade, FilterCoefficients, Sos};
pub use config::{Integration, MeterConfig};
pub use error::CoreError;
pub use traits::{ChunkFilter, StreamState};
