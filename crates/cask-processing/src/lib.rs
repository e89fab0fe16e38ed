//! Cask Processing Library
//!
//! Image transformations applied when derivatives are requested at upload
//! time. Currently covers resizing with the standard CSS-style fit modes.

pub mod resize;

pub use resize::{resize, FitMode};
