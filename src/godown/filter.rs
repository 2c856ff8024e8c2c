//! # Item Filters
//!
//! Filtering is done by the server: the three filters travel as query parameters on
//! `GET /items`. The client's job is to decide *when* to ask.
//!
//! - [`ItemFilter`]: category / brand / status, empty string meaning "no constraint".
//! - [`Debouncer`]: holds the latest value until the input has been quiet for the
//!   configured delay (300 ms by default). Every new value restarts the window.
//! - [`FetchGeneration`]: numbers fetches so that a response to an older request is
//!   dropped instead of overwriting a newer one.
//!
//! Time is passed in explicitly so all of this is testable without sleeping.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemFilter {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub status: String,
}

/// One of the three filter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Category,
    Brand,
    Status,
}

impl std::str::FromStr for FilterField {
    type Err = crate::error::GodownError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "category" => Ok(FilterField::Category),
            "brand" => Ok(FilterField::Brand),
            "status" => Ok(FilterField::Status),
            other => Err(crate::error::GodownError::validation(format!(
                "Unknown filter '{}': expected category, brand or status",
                other
            ))),
        }
    }
}

impl ItemFilter {
    pub fn new(
        category: impl Into<String>,
        brand: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            brand: brand.into(),
            status: status.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_empty() && self.brand.is_empty() && self.status.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FilterField::Category => self.category = value,
            FilterField::Brand => self.brand = value,
            FilterField::Status => self.status = value,
        }
    }

    /// Query parameters in wire order. Empty values are sent too.
    pub fn query_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("category", self.category.as_str()),
            ("brand", self.brand.as_str()),
            ("status", self.status.as_str()),
        ]
    }

    /// Exact-match semantics, used by the in-memory backend to stand in for the server.
    pub fn matches(&self, item: &crate::model::Item) -> bool {
        (self.category.is_empty() || item.category == self.category)
            && (self.brand.is_empty() || item.brand == self.brand)
            && (self.status.is_empty() || item.status.as_str() == self.status)
    }
}

/// Trailing-edge debounce: only the last value pushed within the window is released.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending value and restarts the quiet window from `now`.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Time left before the pending value is released.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline().map(|at| at.saturating_duration_since(now))
    }

    /// Takes the pending value once its window has elapsed.
    pub fn ready(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(at) if now >= at => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Monotonic request numbering. Only the newest ticket is current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Default)]
pub struct FetchGeneration {
    latest: u64,
}

impl FetchGeneration {
    pub fn next(&mut self) -> FetchTicket {
        self.latest += 1;
        FetchTicket(self.latest)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.latest
    }
}
