//! Command plumbing: response shape, execution logging, tracing setup.

pub mod command_helpers;
pub mod logging;
