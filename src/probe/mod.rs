//! Liveness/latency probing through proxies.

pub mod client;
pub mod health;

pub use client::{HttpProbeClient, ProbeClient, ProbeOutcome};
pub use health::HealthChecker;
