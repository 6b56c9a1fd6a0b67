//! Use-case services driving the admin screen.
//!
//! # Responsibility
//! - Keep FFI/CLI callers decoupled from collection and codec details.

pub mod sync_controller;
