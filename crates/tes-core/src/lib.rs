//! Core logic for exporting Telegram sticker sets.
//!
//! This crate knows nothing about MTProto. The Telegram client library lives
//! behind [`ports::StickerClient`], implemented in the adapter crate.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod exporter;
pub mod lister;
pub mod logging;
pub mod metadata;
pub mod ports;
pub mod progress;

pub use errors::{Error, Result};
