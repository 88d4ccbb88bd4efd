//! # Folio Pagination
//!
//! Three stateless pagination strategies over a document collection:
//!
//! ```text
//! PaginationEngine
//!   ├─ paginate            page + limit   → skip/limit + count
//!   ├─ stream              cursor + limit → keyset filter, limit + 1
//!   └─ aggregate_paginate  pipeline       → one $facet execution
//!         ↓  Arc<dyn QueryExecutor>
//! document store (MemoryStore, or an adapter over a real store)
//! ```
//!
//! All position state lives in the caller's `page` or opaque cursor, so one
//! engine can be shared by any number of concurrent requests.

pub mod cursor;
pub mod engine;
pub mod executor;
pub mod memory;
pub mod normalizer;

pub use cursor::{sort_signature, Cursor, CursorCodec};
pub use engine::{AggregateOptions, KeysetOptions, OffsetOptions, PaginationEngine};
pub use executor::{DocumentStore, FindQuery, QueryExecutor};
pub use memory::MemoryStore;
pub use normalizer::{build_keyset_filter, validate_keyset_sort};
