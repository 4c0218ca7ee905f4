//! Relay core library: credential resolution, lazy workspace provisioning, message forwarding,
//! and the HTTP gateway used by the CLI.

pub mod assistant;
pub mod config;
pub mod credentials;
pub mod forward;
pub mod gateway;
pub mod init;
pub mod provision;
pub mod service;
pub mod training;
