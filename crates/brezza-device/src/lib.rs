//! Edge-device data-plane runtime.
//!
//! This crate coordinates the constrained-device control loop: periodic
//! sensor acquisition, a local temperature control policy, validated and
//! deduplicated actuation dispatch, latest-value caches, and optional
//! upstream transport and persistence connectors.
//!
//! The [`manager::DeviceDataManager`] is the composition root; everything
//! else plugs into it through the [`listener::MessageSink`] contract and the
//! connector traits in [`connection`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Device configuration.
pub mod config;
/// Upstream transport and persistence connectors.
pub mod connection;
/// Validated, deduplicated actuation dispatch.
pub mod dispatch;
/// Runtime errors.
pub mod error;
/// Contract between the manager and its sub-managers.
pub mod listener;
/// The device data manager.
pub mod manager;
/// Device performance monitoring.
pub mod perf;
/// Periodic sensor acquisition.
pub mod poller;
/// Simulated and emulated adapter backings.
pub mod sim;
