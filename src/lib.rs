//! Gatekeeper - Token Authentication and Rate Limiting Gateway
//!
//! This crate verifies callers through signed, time-limited tokens, charges
//! each authenticated identity against a sliding-window quota, and maps every
//! refusal to a uniform error. The gate is exposed as a tonic interceptor in
//! front of the protected gRPC service.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod grpc;
pub mod ratelimit;
pub mod token;
