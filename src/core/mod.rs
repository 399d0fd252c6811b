// PacketSleuth - core/mod.rs
//
// Core business logic layer: record model, line parsing, filtering, export.
// Must NOT depend on: app, platform, or touch the filesystem directly.

pub mod export;
pub mod filter;
pub mod model;
pub mod parser;
