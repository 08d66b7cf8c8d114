//! mergeresolve core library.
//!
//! This crate provides the foundational components for three-way merge
//! conflict resolution: the change model and text mutation layer, conflict
//! pairing and classification, the resolve-option chain, the batch
//! orchestrator, the repository collaborator, and configuration.

pub mod config;
pub mod conflict;
pub mod diff;
pub mod errors;
pub mod orchestrator;
pub mod policy;
pub mod progress;
pub mod repository;
pub mod resolve;
pub mod text;

// Re-exports for convenience.
pub use config::EngineConfig;
pub use conflict::{ConflictSide, ConflictType, MergeData};
pub use diff::{FileDiff, SimilarLineDiffer};
pub use orchestrator::{AutoResolveSummary, AutoResolver, FileOutcome, VersionAction};
pub use repository::{Git2Repository, InMemoryRepository, Repository};
pub use resolve::ResolveOptionChain;
