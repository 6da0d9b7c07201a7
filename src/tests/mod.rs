//! integrated tests
pub mod toolkit;

mod time;

#[cfg(feature = "flate2")]
mod compression;
