//! Image sensor register tables

pub mod imx219;

pub use imx219::{Imx219Config, InitSequence, TestPattern, TestPatternConfig};
