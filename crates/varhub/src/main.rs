//! # varhub
//!
//! Terminal client for the `varhubapp` view core. It loads a library snapshot (variable
//! groups and secure files) from a JSON file, optionally applies a few scripted edits,
//! and prints one of the three views:
//!
//! - `varhub tree`: groups and secure files as an expandable hierarchy
//! - `varhub table`: one row per variable, grouped by variable group
//! - `varhub matrix`: one row per variable name, one column per group
//!
//! All the view logic (ordering, filtering, statuses, uniqueness checks) lives in
//! `varhubapp`. This crate only parses arguments, wires a session together and turns
//! row view models into terminal text. Edits are never written back; the footer shows
//! what a save would contain.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
