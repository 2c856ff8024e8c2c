//! # Command Layer
//!
//! One module per concern, each a set of plain functions taking the backend and (for
//! mutations) the session's [`RecordStore`](crate::store::records::RecordStore).
//!
//! Mutations are write-through: validate, call the server, and only on success patch
//! the Record Store with what the server returned. A failed call leaves the store as
//! it was.
//!
//! Results come back as a [`CmdResult`]: the records involved plus leveled messages
//! for the UI to show.

use crate::config::GodownConfig;
use crate::model::{Item, Location, User};

pub mod fetch;
pub mod items;
pub mod locations;
pub mod session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_locations: Vec<Location>,
    pub affected_items: Vec<Item>,
    pub listed_locations: Vec<Location>,
    pub listed_items: Vec<Item>,
    pub user: Option<User>,
    pub config: Option<GodownConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_affected_locations(mut self, locations: Vec<Location>) -> Self {
        self.affected_locations = locations;
        self
    }

    pub fn with_affected_items(mut self, items: Vec<Item>) -> Self {
        self.affected_items = items;
        self
    }

    pub fn with_listed_items(mut self, items: Vec<Item>) -> Self {
        self.listed_items = items;
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_config(mut self, config: GodownConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
