// PacketSleuth - app/mod.rs
//
// Application layer: per-file scanning and run orchestration.
// Dependencies: core layer, platform archive access.

pub mod pipeline;
pub mod scan;
