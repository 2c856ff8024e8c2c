//! # CLI Behavior
//!
//! This is **one possible UI client** for godown. It is the only place that knows
//! about terminal I/O, exit codes and output formatting.
//!
//! ## One-Shot Commands
//!
//! Each invocation is its own session: the token is read from the token file, the
//! tree is fetched, the command runs, and the result is printed. Commands that act on
//! an id (`location rm`, `item add`, ...) fetch first so that validation sees the
//! same records the server has.
//!
//! ## Interactive Shell
//!
//! `godown shell` keeps one session alive and works like the dashboard: open and
//! close locations, select records, type filters (fetched after a quiet period),
//! add and delete. See `shell.rs`.
//!
//! ## Confirmation
//!
//! Two actions ask before they run: an out-of-stock item whose quantity would be
//! reset to 0, and a cascading location delete. `--yes` skips the question; when
//! stdin is not a terminal and `--yes` is missing, the action is refused.
//!
//! ## Module Structure
//!
//! - `commands`: context setup, dispatch and per-command handlers
//! - `render`: tree, detail and message rendering
//! - `setup`: argument parsing via clap
//! - `shell`: the interactive dashboard loop
//! - `styles`: terminal styles

mod commands;
mod render;
pub mod setup;
mod shell;
mod styles;

pub use commands::run;
