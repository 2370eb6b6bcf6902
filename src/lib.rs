#![deny(unreachable_pub)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![allow(clippy::module_name_repetitions)]

//! Polls AWS CloudWatch metric statistics and forwards them as generic
//! `(measurement, tags, fields, timestamp)` records.

#[macro_use]
extern crate tracing;

#[macro_use]
pub mod config;
#[macro_use]
pub mod internal_events;

pub mod app;
pub mod aws;
pub mod cli;
pub mod event;
pub mod sensitive_string;
pub mod serde;
pub mod shutdown;
pub mod source_sender;
pub mod sources;
#[cfg(test)]
pub mod test_util;
pub mod trace;

pub use event::Record;
pub use source_sender::SourceSender;

/// The type of error used across the crate.
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A `Result` carrying the crate-wide [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

pub fn get_version() -> String {
    let pkg_version = env!("CARGO_PKG_VERSION");
    let target = std::env::consts::ARCH;
    format!("{pkg_version} ({target})")
}
