//! In-process event bus for the kudos bot.
//!
//! Wizard handlers publish [`BotEvent`]s after their store writes commit;
//! the notification router subscribes and fans them out to chats. The bus
//! is a thin wrapper over `tokio::sync::broadcast`, so publishing never
//! blocks and never fails the publishing operation.

pub mod bus;

pub use bus::{BotEvent, EventBus};
pub use bus::{
    ORDER_COMPLETED, POINTS_GRANTED, SUBMISSION_APPROVED, SUBMISSION_RECEIVED,
    SUBMISSION_REJECTED, SYSTEM_RESET,
};
