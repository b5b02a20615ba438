//! Rasterization, compositing and the render pipeline.

pub mod canvas;
pub mod composite;
pub mod pipeline;
pub mod raster;
