//! Dependency resolution engine for trellis
//!
//! Given direct dependencies, this crate finds one version per project,
//! transitively, such that every requirement in the graph holds. Resolution
//! is built on [`Process`], a lazy computation that streams progress events
//! while it works towards a single outcome:
//!
//! - [`engine::step`] satisfies one dependency, fanning out concurrently over
//!   all candidate versions and keeping the best complete outcome
//! - [`engine::resolve_with`] folds a dependency list through `step`
//! - [`Resolver`] wraps both behind a recipe source and a strategy

pub mod engine;
pub mod error;
pub mod event;
pub mod process;
pub mod resolver;
pub mod strategy;

// Re-export main types
pub use engine::{resolve, resolve_with, step, ResolutionProcess, RESOLUTION_STACK_SIZE};
pub use error::ResolutionError;
pub use event::ResolutionEvent;
pub use process::{Continuation, EventSink, Process};
pub use resolver::{ResolutionResult, Resolver};
pub use strategy::{
    LockedResolutionStrategy, NewestResolutionStrategy, OldestResolutionStrategy,
    ResolutionStrategy, Score,
};

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, ResolutionError>;
