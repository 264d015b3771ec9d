// Raffle draw logic: configuration validation and the draw engine.

pub mod config;
pub mod engine;
