//! The data interface between an edge device and its upstream consumers.
//!
//! This crate provides the record types that flow through a `brezza` device:
//!
//! - [`reading::SensorReading`]: a single timestamped measurement produced by
//!   one sensor.
//! - [`actuation::Actuation`]: a directive to change an actuator's state and,
//!   once applied, the outcome record of that directive. Commands and
//!   responses share one shape, distinguished by a response flag.
//! - [`perf::PerformanceSample`]: a device-level CPU and memory utilization
//!   snapshot.
//! - [`resource::Resource`]: the logical addressing key used to relay records
//!   upstream and to key best-effort persistence, independent of any
//!   transport.
//!
//! Every record serializes to JSON through `serde` and round-trips all of its
//! fields losslessly. Timestamps are UTC wall-clock instants that are
//! refreshed on every mutation of a record and never move backwards within
//! one instance.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Actuator command and response records.
pub mod actuation;
/// Device performance records.
pub mod perf;
/// Sensor reading records.
pub mod reading;
/// Logical upstream resource names.
pub mod resource;

/// Placeholder for identity fields that have not been assigned yet.
pub const NOT_SET: &str = "not-set";

pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};

    // Refreshes a record timestamp, keeping it non-decreasing even if the
    // wall clock steps backwards between two mutations.
    pub(crate) fn refresh(current: DateTime<Utc>) -> DateTime<Utc> {
        Utc::now().max(current)
    }
}
