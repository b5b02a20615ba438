//! Normalized document model.

pub mod model;
