//! # Godown Architecture
//!
//! Godown is a client for a warehouse ("godown") inventory service. Users log in,
//! browse a tree of storage locations (godowns holding sub-locations holding items),
//! and create, inspect and delete locations and items.
//!
//! All durable state lives on the server. The client keeps one session's copy of the
//! records and derives every view from that copy.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, renders views, prompts, runs the shell │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Owns the session: Record Store, view state, filters      │
//! │  - Session guard, fetch ordering, 401 handling              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Validation and write-through mutations                   │
//! │  - Returns CmdResult with records and leveled messages      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Backend Layer (store/)                                     │
//! │  - InventoryBackend trait, one method per REST call         │
//! │  - RestBackend (production), MemBackend (testing)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Next to the layers sit the pure derivations: [`hierarchy`] turns flat records into a
//! tree, [`view`] composes the dashboard from the store and a [`view::ViewState`], and
//! [`filter`] handles item filters, debouncing and fetch ordering.
//!
//! ## No I/O in the Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr, never prompts and never
//! exits. Anything needing a human decision (the out-of-stock quantity reset, a
//! cascading delete) comes back as an error or a preview for the UI to ask about.
//!
//! ## Testing Strategy
//!
//! 1. **Commands**: unit tests against [`store::memory::MemBackend`], the bulk of
//!    the suite.
//! 2. **Derivations** (`hierarchy`, `view`, `filter`): pure functions, tested directly.
//! 3. **API**: session guard, fetch ordering and dispatch.
//! 4. **CLI**: `tests/` drives the binary with `assert_cmd` for offline behavior.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, entry point for all operations
//! - [`commands`]: Validation and mutations
//! - [`store`]: Backend trait, REST client, in-memory server, Record Store
//! - [`model`]: Records and drafts (`Location`, `Item`, `ItemDraft`, ...)
//! - [`hierarchy`]: Adjacency built from flat records
//! - [`view`]: View state and dashboard composition
//! - [`filter`]: Item filters, debouncer, fetch tickets
//! - [`auth`]: JWT expiry check and token storage
//! - [`config`]: Configuration and directories
//! - [`error`]: Error types
//! - `cli`: Argument parsing, rendering and the interactive shell (binary only)

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod model;
pub mod store;
pub mod view;
