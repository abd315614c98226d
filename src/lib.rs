//! Library crate for eduadmin.
//!
//! This crate exposes the building blocks of the TUI:
//! - Entity kinds, form records and validators (`entity`)
//! - The generic create/edit/view modal, its config registry and error normalization (`modal`)
//! - In-memory stand-in for the platform API (`api`)
//! - Application state, key handling and the event loop (`app`)
//! - Error and result types (`error`)
//! - Table search helpers (`search`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `eduadmin` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod app;
pub mod entity;
pub mod error;
pub mod modal;
pub mod search;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
