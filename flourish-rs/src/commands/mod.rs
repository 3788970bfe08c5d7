//! Command implementations

pub mod clip;
