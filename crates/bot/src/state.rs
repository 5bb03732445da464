//! Shared bot state handed to every handler.

use std::sync::Arc;

use kudos_events::EventBus;
use kudos_store::JsonStore;

use crate::config::BotConfig;
use crate::session::SessionMap;
use crate::transport::ChatTransport;

/// Everything a handler needs, cheap to clone per update.
#[derive(Clone)]
pub struct BotContext {
    pub store: Arc<JsonStore>,
    pub config: Arc<BotConfig>,
    pub sessions: Arc<SessionMap>,
    pub event_bus: Arc<EventBus>,
    pub transport: Arc<dyn ChatTransport>,
}
