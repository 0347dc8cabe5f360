mod document;
mod client;
mod project;

pub use document::{parse_timestamp, Document};
pub use client::{ClientRecord, Field, RecordDefaults};
pub use project::{ProjectStatus, ProjectViewModel};
