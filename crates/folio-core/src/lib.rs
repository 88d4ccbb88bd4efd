//! # Folio Core
//!
//! Core types, traits, and error definitions for Folio.
//! This crate provides the document model, query vocabulary (filters,
//! sorts, projections, aggregate stages), and pagination result shapes
//! shared by the pagination engine and the cache-aside layer.

pub mod document;
pub mod error;
pub mod filter;
pub mod id;
pub mod pagination;
pub mod pipeline;
pub mod result;
pub mod sort;
pub mod telemetry;

pub use document::*;
pub use error::*;
pub use filter::*;
pub use id::*;
pub use pagination::*;
pub use pipeline::*;
pub use result::*;
pub use sort::*;
