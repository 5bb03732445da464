//! Domain model for the kudos bot.
//!
//! Entities, validation, and the business rules that do not touch storage
//! or the chat transport:
//!
//! - [`user`]: member records and the two-ledger points arithmetic.
//! - [`task`] / [`availability`]: the task catalog and the one-time /
//!   daily repeat rules.
//! - [`submission`]: submission snapshots, drafts, and the one-shot
//!   review transition.
//! - [`product`] / [`order`]: the shop catalog, stock accounting, and
//!   purchase receipts.
//! - [`stats`]: leaderboard ranking and system counters.

pub mod availability;
pub mod error;
pub mod order;
pub mod product;
pub mod stats;
pub mod submission;
pub mod task;
pub mod types;
pub mod user;

pub use error::CoreError;
pub use types::{PlatformId, SeqKey, Timestamp};
