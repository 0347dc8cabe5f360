//! Live construction-project dashboard over a document store.
//!
//! Client documents are read through a [`store::DocumentStore`], turned into
//! [`models::ProjectViewModel`]s by the [`feed`], and shown by the terminal
//! [`ui`].

pub mod config;
pub mod feed;
pub mod format;
pub mod logging;
pub mod models;
pub mod progress;
pub mod store;
pub mod ui;
