//! Gate crossing detection and lap timing for a single ranging sensor
//!
//! A distance sensor looks across a gate. Every sampling cycle its reading is
//! compared against a rolling baseline of the ambient distance; a sustained
//! deviation is a crossing, and two crossings make a lap.
//!
//! ## Architecture
//!
//! ```text
//! reading ─▶ GateController ─▶ TriggerDetector ─▶ Events ─▶ EventRecord
//!            (run / cooldown)   baseline window             (transport)
//!                               detection window
//! ```
//!
//! ## Modules
//!
//! - [`window`] - fixed capacity rolling average
//! - [`detector`] - crossing detection and lap pairing
//! - [`controller`] - run/stop, post-lap cooldown and lap statistics
//! - [`config`] - validated detector parameters
//! - [`event`] - events consumed by logging and transport
//! - [`record`] - timestamped event records and their wire encoding
//!
//! The crate is `no_std` and never allocates.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod controller;
pub mod detector;
pub mod event;
pub mod record;
pub mod window;

pub use config::{ConfigError, DetectorConfig};
pub use controller::{GateController, GateState};
pub use detector::{percent_difference, TriggerDetector};
pub use event::{matched_lap, Event, Events};
pub use record::EventRecord;
pub use window::BoundedAverageWindow;
