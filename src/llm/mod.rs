//! LLM-based conflict resolution fallback.
//!
//! Invoked only for files the structural resolver could not handle. The
//! resolver builds a deterministic prompt from the conflicting triple and
//! delegates to a pluggable JSON-completion provider. Every failure mode
//! (no provider, transport error, malformed reply, cancellation) degrades to
//! returning the left content verbatim with a failure diagnostic: an
//! automated system must not invent content when uncertain.

pub mod prompt;
pub mod provider;
pub mod resolver;

pub use provider::{
    Completion, CompletionProvider, DisabledProvider, FallbackProvider, HostedCompletionProvider,
    ProviderError,
};
pub use resolver::{ConflictResolver, LlmResolution};
