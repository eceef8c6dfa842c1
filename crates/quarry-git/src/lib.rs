//! Revision store accessor for quarry.
//!
//! This crate defines the [`RevisionStore`] trait — the single interface
//! through which the miner queries a repository's commit graph. The mining
//! crate never imports gix (or any other git library) directly; it depends on
//! `quarry-git` and programs against the trait.
//!
//! The whole surface is read-only: resolving refs, reading revision metadata
//! and tree content, tree-to-tree diffs, reference operation logs (reflogs),
//! ancestry queries, and transient operation marker files. Nothing here can
//! mutate the canonical store.
//!
//! # Crate layout
//!
//! - [`store`] — the [`RevisionStore`] trait definition.
//! - [`types`] — value types used in trait signatures ([`RevisionId`],
//!   [`RefName`], [`Revision`], [`DiffEntry`], [`OperationLogEntry`]).
//! - [`error`] — the [`StoreError`] enum returned by all trait methods.

pub mod error;
pub mod store;
pub mod types;

// gix-backed implementation modules
mod diff_impl;
mod gix_store;
mod log_impl;
mod objects_impl;
mod refs_impl;

pub use gix_store::GixStore;

// Re-export the main trait and commonly used types at the crate root for
// ergonomic imports: `use quarry_git::{RevisionStore, RevisionId, StoreError};`
pub use error::StoreError;
pub use store::RevisionStore;
pub use types::{
    ChangeKind, DiffEntry, IdParseError, OperationLogEntry, RefName, RefNameError, Revision,
    RevisionId,
};
