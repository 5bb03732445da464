//! JSON document persistence for the kudos bot.
//!
//! Five independent documents (users, tasks, submissions, products,
//! orders), each a mapping from decimal-string sequence key to a record:
//!
//! - [`Collection`]: one document, an in-memory `BTreeMap` behind an
//!   async `RwLock` with atomic tmp-file-and-rename persistence and the
//!   `mutate` read-modify-write primitive.
//! - [`JsonStore`]: owns the five collections and the full-reset path.
//! - [`repositories`]: typed domain operations over the store.
//!
//! Storage failures surface as [`StoreError`]; an unreadable document is
//! never treated as an empty one.

pub mod collection;
pub mod error;
pub mod repositories;
pub mod store;

pub use collection::{next_seq_key, Collection};
pub use error::{RepoError, StoreError};
pub use store::{JsonStore, ResetCounts};
