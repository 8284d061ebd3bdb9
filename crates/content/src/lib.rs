//! Content backend client for the menu-board player.
//!
//! Provides the menu query over HTTP, the change-notification listener
//! (server-sent events), listener message parsing, reconnection backoff,
//! and the [`source::ContentSource`] seam the synchronizer is written
//! against.

pub mod api;
pub mod config;
pub mod error;
pub mod listener;
pub mod messages;
pub mod queries;
pub mod reconnect;
pub mod source;
pub mod sse;
pub mod subscription;
