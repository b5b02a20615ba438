//! Image asset decoding.

pub mod decode;
