//! Menu-board player: live menu synchronization, screen mode control and
//! the HTTP surface the rendering layer talks to.

pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod sync;
