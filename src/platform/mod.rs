// PacketSleuth - platform/mod.rs
//
// Platform layer: support packet container access and config files.

pub mod archive;
pub mod config;
