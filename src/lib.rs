// src/lib.rs
// Scope CSV Reader Library - Public API

//! # Scope CSV Reader
//!
//! A Rust library for reading oscilloscope CSV exports (Tektronix TDS layout)
//! into typed, validated captures.
//!
//! ## Features
//!
//! - Parse the metadata header rows into a strongly-typed [`Header`]
//! - Reject unknown or missing header parameters with precise errors
//! - Load a single capture file or a directory with one file per channel
//! - Route files to channels by their declared `Source`
//! - Export channel data back to CSV
//!
//! ## Example
//!
//! ```no_run
//! use scopecsv_reader::{load_directory, Channel};
//!
//! let capture = load_directory("ALL0001").expect("Failed to load capture");
//!
//! if let Some(ch1) = capture.channel(Channel::Channel1) {
//!     println!("CH1: {} samples at {} S/s", ch1.len(), ch1.header().sample_rate());
//! }
//!
//! // Export both channels side by side
//! capture.write_csv("merged.csv").expect("Failed to write CSV");
//! ```

mod capture;
mod channel;
mod error;
mod header;
pub mod reader;

pub use capture::{
    load_directory, load_single, Capture, CaptureLoader, LoadOptions, DEFAULT_HEADER_ROWS,
    MAX_CAPTURE_FILES,
};
pub use channel::ChannelRecord;
pub use error::{Result, ScopeError};
pub use header::{Channel, Header, HeaderBuilder, Parameter, RawHeader, Unit};
