//! # Godown CLI
//!
//! The binary is intentionally thin: the CLI lives in `cli/` and this file only
//! invokes `cli::run()` and turns an error into a message and exit code 1.
//!
//! Everything from `api.rs` inward is UI agnostic; the CLI owns argument parsing,
//! context setup (config, token file, REST client), prompting, rendering and the
//! interactive shell. See the library docs for the layer diagram.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
