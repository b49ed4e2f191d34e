//! Merge Pilot - three-way merge conflict resolution for GitHub automation.
//!
//! This library provides the conflict-resolution core: per-language structural
//! resolvers, an LLM fallback, a build/test verification stage, and the
//! orchestrator that ties them together behind a policy gate.

pub mod context;
pub mod engine;
pub mod llm;
pub mod policy;
pub mod report;
pub mod resolve;
pub mod types;
pub mod verify;
