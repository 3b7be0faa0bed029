//! Trainer workload service: HTTP API, authentication and event intake.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod messaging;
pub mod payload;
pub mod routes;
pub mod state;
