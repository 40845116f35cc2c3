//! Resolve instance references and IFC type documentation in STEP physical files.
//!
//! Two kinds of lookups are answered for a cursor position in an ISO-10303-21
//! document: `#123` jumps to the line defining that instance, and a
//! constructor name such as `IFCWALL(` resolves to its documentation page for
//! the schema declared in the file header, with the attribute inheritance table
//! rendered as markdown where the documentation provides one.
//!
//! The host editor supplies a [`document::Document`] and an
//! [`http::HttpClient`]; [`service::ResolutionService`] does the rest.

pub mod attributes;
pub mod catalog;
pub mod config;
pub mod doclink;
pub mod document;
pub mod error;
pub mod http;
pub mod line_index;
pub mod reference;
pub mod schema;
pub mod service;
pub mod type_name;
pub mod types;

pub use crate::document::{Document, Position, TextDocument};
pub use crate::error::Error;
pub use crate::service::{DocumentCache, ResolutionService};
pub use crate::types::ResolutionResult;
