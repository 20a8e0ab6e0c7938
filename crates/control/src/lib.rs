//! Control systems for the charging loop
//!
//! This crate provides:
//! - PID controllers with output saturation
//! - A cascaded voltage/current charge controller with per-step mode selection

pub mod charge_controller;
pub mod pid;

pub use charge_controller::*;
pub use pid::*;
