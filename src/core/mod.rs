//! Core building blocks: the ramp/variable catalogue, variable resolution,
//! compiled ramp tables, and the colorize/finish processing steps. These are
//! consumed by the high-level `api` module.
pub mod config;
pub mod params;
pub mod processing;
pub mod ramp;
pub mod resolver;
