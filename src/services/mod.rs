//! Network services: the HTTP API shared by desktop and ESP32.
//!
//! - `web` feature: Axum-based HTTP server for the desktop simulator
//! - `wifi` feature: the same handler logic, served by `esp-idf-svc`
//!
//! Both servers go through [`HttpApiHandler`] over a [`StateProvider`], so
//! the request parsing and response shapes live in one place.
//!
//! # Shared State Pattern
//!
//! On the desktop one [`SharedFridgeState`] is shared by the control loop
//! and the web server:
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_fridge::services::{build_router, SharedFridgeState, UpdateService};
//!
//! let state = Arc::new(SharedFridgeState::new(controller, updates));
//! let router = build_router(Arc::clone(&state), &web_config);
//! ```

#[cfg(any(feature = "web", feature = "wifi"))]
pub mod shared;

#[cfg(any(feature = "web", feature = "wifi"))]
pub mod api;

// HTTP handler logic (shared between desktop and ESP32)
#[cfg(any(feature = "web", feature = "wifi"))]
pub mod http_handler;

#[cfg(feature = "web")]
pub mod web;

// Re-exports
#[cfg(any(feature = "web", feature = "wifi"))]
pub use shared::*;

#[cfg(any(feature = "web", feature = "wifi"))]
pub use api::*;

#[cfg(any(feature = "web", feature = "wifi"))]
pub use http_handler::*;

#[cfg(feature = "web")]
pub use web::*;
