//! Domain model for weather notifications and their stored documents.
//!
//! # Responsibility
//! - Define the in-memory notification record and form input.
//! - Define the document shape exchanged with the collection.
//! - Convert between the two without touching storage.

pub mod codec;
pub mod document;
pub mod notification;
