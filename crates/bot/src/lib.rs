//! Chat bot runtime for the kudos community points system.
//!
//! - [`dispatcher`] routes incoming [`transport::Update`]s to handlers.
//! - [`handlers`] implement the flows: registration, tasks and
//!   submissions, the points shop, and the admin panel.
//! - [`session`] keeps per-conversation wizard state in memory.
//! - [`notifications`] turns bus events into admin alerts and member
//!   notices.
//! - [`transport`] is the seam to the actual chat platform.

pub mod callback;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod notifications;
pub mod render;
pub mod session;
pub mod state;
pub mod transport;

pub use config::BotConfig;
pub use error::{BotError, BotResult};
pub use state::BotContext;
