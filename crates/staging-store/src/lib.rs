//! # staging-store: Stage Storage Collaborators
//!
//! Implementations of [`staging_core::StageStore`]:
//!
//! - [`FsStageStore`] reads stages from a directory tree on local disk.
//! - [`MemoryStageStore`] keeps stages in a process-local map, for tests
//!   and for embedding the resolver without a filesystem.
//!
//! Both are synchronous. The HTTP layer moves calls onto the blocking pool.

pub mod fs;
pub mod memory;

pub use fs::FsStageStore;
pub use memory::MemoryStageStore;
