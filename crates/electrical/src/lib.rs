//! Electrical plant models for the charging loop
//!
//! - `battery`: single-state SOC battery with a lumped thermal node
//! - `converter`: averaged buck converter inductor dynamics
//! - `analysis`: offline traces built on both

pub mod analysis;
pub mod battery;
pub mod converter;

pub use battery::{Battery, BatteryConstant};
pub use converter::{BuckConverter, ConverterConstant};
