//! Domain model and pure state machines for the menu-board player.
//!
//! Nothing in this crate performs I/O. The content client lives in
//! `menuboard-content` and the async runtime pieces (synchronizer,
//! controller task, HTTP surface) live in `menuboard-player`.

pub mod availability;
pub mod board_view;
pub mod countdown;
pub mod error;
pub mod keyboard;
pub mod model;
pub mod pricing;
pub mod screen_mode;
pub mod screens;
pub mod types;
