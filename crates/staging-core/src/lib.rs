//! # staging-core: Addressing and Envelopes for LDR Staging
//!
//! A stage holds segments, a segment holds material suites, and a suite
//! holds content, an optional PREMIS record, technical metadata, and a
//! recursive list of presforms. This crate defines that tree, the rules
//! for addressing nodes in it by escaped identifiers, and the envelope
//! every API reply is wrapped in.
//!
//! ## Key Design Principles
//!
//! 1. **Exactly one match.** Every lookup step requires a single matching
//!    child. Absence and ambiguity fail identically with a level-specific
//!    [`StagingError::NotFound`].
//!
//! 2. **One comparison policy per level.** Suites and technical metadata
//!    compare escaped names, presforms compare raw names. The choice lives
//!    in [`resolver`] constants built on [`MatchPolicy`].
//!
//! 3. **One node shape at every depth.** A presform is a [`MaterialSuite`];
//!    a presform chain is resolved by repeating the same lookup.
//!
//! 4. **Storage is a collaborator.** The core only sees the [`StageStore`]
//!    trait and a materialized [`Stage`].
//!
//! ## Crate Policy
//!
//! - Leaf of the workspace DAG; no dependencies on other `staging-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod address;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod pipeline;
pub mod projection;
pub mod resolver;
pub mod store;
pub mod tree;

// Re-export primary types for ergonomic imports.
pub use address::{Address, Facet, SuitePath};
pub use codec::{escape, unescape, MatchPolicy};
pub use envelope::{ResponseEnvelope, Status};
pub use error::{Level, StagingError, ValidationError};
pub use pipeline::{execute, Outcome};
pub use store::{StageStore, StoreError};
pub use tree::{Item, ItemSource, MaterialSuite, Presform, Segment, Stage};
