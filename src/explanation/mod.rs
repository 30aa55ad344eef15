//! Rendering of feasibility results for people and for clients

pub mod formatters;

pub use formatters::{JsonFormatter, MarkdownFormatter};
