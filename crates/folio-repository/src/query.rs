//! Read request shapes accepted by the repository.

use folio_core::{Filter, Projection, SortSpec};
use folio_pagination::{KeysetOptions, OffsetOptions};
use serde::{Deserialize, Serialize};

/// Options for single-document reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadOptions {
    pub projection: Option<Projection>,
    pub populate: Vec<String>,
    /// Bypass any read-through cache for this call.
    #[serde(default)]
    pub skip_cache: bool,
}

impl ReadOptions {
    #[must_use]
    pub fn uncached() -> Self {
        Self {
            skip_cache: true,
            ..Self::default()
        }
    }

    /// True when the read returns something other than the full document.
    #[must_use]
    pub fn is_shaped(&self) -> bool {
        self.projection.as_ref().is_some_and(|p| !p.is_empty()) || !self.populate.is_empty()
    }
}

/// Pagination strategy of a list read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ListMode {
    Offset(OffsetOptions),
    Keyset(KeysetOptions),
}

/// A list read: a pagination strategy plus per-call flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub mode: ListMode,
    pub skip_cache: bool,
}

impl ListQuery {
    #[must_use]
    pub fn offset(options: OffsetOptions) -> Self {
        Self {
            mode: ListMode::Offset(options),
            skip_cache: false,
        }
    }

    #[must_use]
    pub fn keyset(options: KeysetOptions) -> Self {
        Self {
            mode: ListMode::Keyset(options),
            skip_cache: false,
        }
    }

    #[must_use]
    pub fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }

    /// The limit the caller asked for, before clamping.
    #[must_use]
    pub fn requested_limit(&self) -> Option<u64> {
        match &self.mode {
            ListMode::Offset(options) => options.limit,
            ListMode::Keyset(options) => options.limit,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &Filter {
        match &self.mode {
            ListMode::Offset(options) => &options.filter,
            ListMode::Keyset(options) => &options.filter,
        }
    }

    #[must_use]
    pub fn sort(&self) -> Option<&SortSpec> {
        match &self.mode {
            ListMode::Offset(options) => options.sort.as_ref(),
            ListMode::Keyset(options) => options.sort.as_ref(),
        }
    }
}

impl From<OffsetOptions> for ListQuery {
    fn from(options: OffsetOptions) -> Self {
        Self::offset(options)
    }
}

impl From<KeysetOptions> for ListQuery {
    fn from(options: KeysetOptions) -> Self {
        Self::keyset(options)
    }
}
