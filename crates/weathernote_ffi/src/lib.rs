//! Flutter bridge for the weather notification admin screen.

pub mod api;
