//! Fonts and text layout.

pub mod family;
pub mod font;
pub mod layout;
pub mod resolve;
