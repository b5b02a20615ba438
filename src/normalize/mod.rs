//! Unit resolution: record geometry to output-canvas pixels.

pub mod units;

pub use units::{CanvasSize, resolve_units};
