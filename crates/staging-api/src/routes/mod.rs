//! # API Route Modules
//!
//! - `stages`: the read-only stage tree under `/v1/stages`, plus 501
//!   stubs for the declared mutation methods.

pub mod stages;
