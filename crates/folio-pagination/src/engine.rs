//! Pagination engine: offset, keyset, and aggregate strategies.

use crate::cursor::CursorCodec;
use crate::executor::{FindQuery, QueryExecutor};
use crate::normalizer::{build_keyset_filter, validate_keyset_sort};
use folio_config::PaginationConfig;
use folio_core::{
    Document, Filter, FolioError, FolioResult, KeysetPage, OffsetPage, Projection, SortSpec, Stage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const FACET_DOCS: &str = "docs";
const FACET_TOTAL: &str = "total";
const FACET_COUNT_FIELD: &str = "count";

/// Options for [`PaginationEngine::paginate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetOptions {
    pub filter: Filter,
    pub sort: Option<SortSpec>,
    /// 1-based page number.
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub projection: Option<Projection>,
    pub populate: Vec<String>,
    /// Use the store's estimated count when `filter` is empty.
    pub estimated_count: bool,
}

/// Options for [`PaginationEngine::stream`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeysetOptions {
    pub filter: Filter,
    pub sort: Option<SortSpec>,
    /// Cursor returned as `next` by the previous page.
    pub after: Option<String>,
    pub limit: Option<u64>,
    pub projection: Option<Projection>,
    pub populate: Vec<String>,
}

/// Options for [`PaginationEngine::aggregate_paginate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateOptions {
    pub pipeline: Vec<Stage>,
    /// 1-based page number.
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Stateless pagination over one collection.
///
/// The engine holds no per-request state; position is carried entirely by
/// the caller's page number or cursor.
#[derive(Clone)]
pub struct PaginationEngine {
    executor: Arc<dyn QueryExecutor>,
    config: PaginationConfig,
    codec: CursorCodec,
}

impl PaginationEngine {
    /// Creates an engine over a collection-scoped executor.
    pub fn new(executor: Arc<dyn QueryExecutor>, config: PaginationConfig) -> Self {
        let codec = CursorCodec::new(config.cursor_version, config.id_field.clone());
        Self {
            executor,
            config,
            codec,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Clamps a requested limit into `1..=max_limit`.
    #[must_use]
    pub fn clamp_limit(&self, limit: Option<u64>) -> u64 {
        limit
            .unwrap_or(self.config.default_limit)
            .clamp(1, self.config.max_limit.max(1))
    }

    fn clamp_page(page: Option<u64>) -> u64 {
        page.unwrap_or(1).max(1)
    }

    fn deep_page_warning(&self, page: u64) -> Option<String> {
        if page <= self.config.deep_page_threshold {
            return None;
        }
        warn!(
            page,
            threshold = self.config.deep_page_threshold,
            "Deep offset pagination requested"
        );
        Some(format!(
            "page {} is beyond the deep pagination threshold of {}; use cursor pagination for deep traversal",
            page, self.config.deep_page_threshold
        ))
    }

    /// Offset pagination: one find plus one count, run concurrently.
    pub async fn paginate(&self, options: &OffsetOptions) -> FolioResult<OffsetPage> {
        let page = Self::clamp_page(options.page);
        let limit = self.clamp_limit(options.limit);
        let skip = (page - 1).saturating_mul(limit);

        let sort = match &options.sort {
            Some(sort) if !sort.is_empty() => validate_keyset_sort(sort, &self.config.id_field)?,
            _ => SortSpec::new().asc(self.config.id_field.clone()),
        };

        let query = FindQuery {
            filter: options.filter.clone(),
            sort,
            skip,
            limit: Some(limit),
            projection: options.projection.clone(),
            populate: options.populate.clone(),
        };

        let use_estimate = options.filter.is_empty()
            && (options.estimated_count || self.config.estimated_count_when_unfiltered);

        debug!(page, limit, skip, use_estimate, "Offset pagination");

        let count = async {
            if use_estimate {
                self.executor.estimated_document_count().await
            } else {
                self.executor.count_documents(&options.filter).await
            }
        };
        let (mut docs, total) = tokio::try_join!(self.executor.find(&query), count)?;
        truncate(&mut docs, limit);

        let result = OffsetPage::new(docs, page, limit, total);
        Ok(match self.deep_page_warning(page) {
            Some(warning) => result.with_warning(warning),
            None => result,
        })
    }

    /// Keyset pagination: continues strictly after `options.after` and
    /// over-fetches one row to learn whether another page exists.
    pub async fn stream(&self, options: &KeysetOptions) -> FolioResult<KeysetPage> {
        let requested = options
            .sort
            .as_ref()
            .filter(|s| !s.is_empty())
            .ok_or(FolioError::MissingSort)?;
        let id_field = self.config.id_field.as_str();
        let sort = validate_keyset_sort(requested, id_field)?;
        let limit = self.clamp_limit(options.limit);

        let filter = match &options.after {
            Some(token) => {
                let cursor = self.codec.decode_for(token, &sort)?;
                build_keyset_filter(&options.filter, &sort, &cursor.sort_values, &cursor.id, id_field)?
            }
            None => options.filter.clone(),
        };

        // The last row must carry every sort field to build the next cursor.
        let projection = options.projection.clone().map(|mut projection| {
            if !projection.is_empty() {
                for field in sort.field_names() {
                    projection.add(field);
                }
            }
            projection
        });

        let query = FindQuery {
            filter,
            sort: sort.clone(),
            skip: 0,
            limit: Some(limit + 1),
            projection,
            populate: options.populate.clone(),
        };

        debug!(limit, continued = options.after.is_some(), sort = %sort, "Keyset pagination");

        let mut docs = self.executor.find(&query).await?;
        let next = if docs.len() as u64 > limit {
            truncate(&mut docs, limit);
            match docs.last() {
                Some(last) => Some(self.codec.encode(last, &sort)?),
                None => None,
            }
        } else {
            None
        };

        Ok(KeysetPage::new(docs, limit, next))
    }

    /// Aggregate pagination: appends a facet producing the page and the
    /// total in a single execution.
    pub async fn aggregate_paginate(&self, options: &AggregateOptions) -> FolioResult<OffsetPage> {
        let page = Self::clamp_page(options.page);
        let limit = self.clamp_limit(options.limit);
        let skip = (page - 1).saturating_mul(limit);

        let mut pipeline = options.pipeline.clone();
        pipeline.push(Stage::Facet(vec![
            (FACET_DOCS.to_string(), vec![Stage::Skip(skip), Stage::Limit(limit)]),
            (FACET_TOTAL.to_string(), vec![Stage::Count(FACET_COUNT_FIELD.to_string())]),
        ]));

        debug!(page, limit, stages = pipeline.len(), "Aggregate pagination");

        let rows = self.executor.aggregate(&pipeline).await?;
        let facet = rows.into_iter().next().unwrap_or_default();

        let mut docs = match facet.get(FACET_DOCS) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_object()
                        .cloned()
                        .ok_or_else(|| FolioError::store("aggregate produced a non-document row"))
                })
                .collect::<FolioResult<Vec<Document>>>()?,
            Some(_) => return Err(FolioError::store("aggregate facet 'docs' is not an array")),
        };
        truncate(&mut docs, limit);

        let total = facet
            .get(FACET_TOTAL)
            .and_then(Value::as_array)
            .and_then(|counts| counts.first())
            .and_then(|row| row.get(FACET_COUNT_FIELD))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let result = OffsetPage::new(docs, page, limit, total);
        Ok(match self.deep_page_warning(page) {
            Some(warning) => result.with_warning(warning),
            None => result,
        })
    }
}

impl std::fmt::Debug for PaginationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn truncate(docs: &mut Vec<Document>, limit: u64) {
    docs.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
}
