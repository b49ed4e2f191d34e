//! Core domain types for the merge pipeline.
//!
//! This module contains all the fundamental types used throughout the
//! application, designed to encode invariants via the type system.

pub mod context;
pub mod decision;
pub mod ids;

// Re-export commonly used types at the module level
pub use context::{FileTriple, Language, MergeContext};
pub use decision::{
    MergeDecision, MergeResult, MergeVerification, PolicyDecision, ResolutionStrategy,
    ResolverVerdict,
};
pub use ids::{OrgId, PrNumber, RepoId, Revision};
