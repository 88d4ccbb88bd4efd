//! In-process document store.
//!
//! Evaluates the full query vocabulary (filters, sorts, projections and
//! every aggregate stage) against documents held in memory. Used by tests
//! and by embedders that do not need durability.

use crate::executor::{DocumentStore, FindQuery, QueryExecutor};
use async_trait::async_trait;
use folio_core::{
    compare_values, field_or_null, set_path, values_equal, Accumulator, Document, DocumentId,
    Filter, FolioError, FolioResult, Stage,
};
use parking_lot::RwLock;
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use tracing::debug;

const GROUP_KEY: &str = "_id";

/// A collection held in memory, in insertion order.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    docs: Arc<RwLock<Vec<Document>>>,
    id_field: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("_id")
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            docs: Arc::new(RwLock::new(Vec::new())),
            id_field: id_field.into(),
        }
    }

    /// Creates a store pre-loaded with `docs`. Documents are kept as given.
    #[must_use]
    pub fn with_documents(id_field: impl Into<String>, docs: Vec<Document>) -> Self {
        let store = Self::new(id_field);
        *store.docs.write() = docs;
        store
    }

    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn prepare_insert(&self, existing: &[Document], mut doc: Document) -> FolioResult<Document> {
        match doc.get(&self.id_field) {
            Some(id) if !id.is_null() => {
                if existing
                    .iter()
                    .any(|d| d.get(&self.id_field).is_some_and(|v| values_equal(v, id)))
                {
                    return Err(FolioError::store(format!("duplicate key: {}", id)));
                }
            }
            _ => {
                doc.insert(self.id_field.clone(), DocumentId::new().to_value());
            }
        }
        Ok(doc)
    }

    fn apply_patch(&self, doc: &mut Document, patch: &Document) {
        for (path, value) in patch {
            if path == &self.id_field {
                continue;
            }
            set_path(doc, path, value.clone());
        }
    }

    fn select(&self, query: &FindQuery) -> Vec<Document> {
        let mut matched: Vec<Document> = self
            .docs
            .read()
            .iter()
            .filter(|d| query.filter.matches(d))
            .cloned()
            .collect();

        matched.sort_by(|a, b| query.sort.compare(a, b));

        let skip = to_usize(query.skip);
        let limit = query.limit.map_or(usize::MAX, to_usize);
        matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| match &query.projection {
                Some(projection) => projection.apply(&doc, &self.id_field),
                None => doc,
            })
            .collect()
    }
}

#[async_trait]
impl QueryExecutor for MemoryStore {
    async fn find(&self, query: &FindQuery) -> FolioResult<Vec<Document>> {
        Ok(self.select(query))
    }

    async fn find_one(&self, query: &FindQuery) -> FolioResult<Option<Document>> {
        let query = FindQuery {
            limit: Some(1),
            ..query.clone()
        };
        Ok(self.select(&query).into_iter().next())
    }

    async fn count_documents(&self, filter: &Filter) -> FolioResult<u64> {
        let count = self.docs.read().iter().filter(|d| filter.matches(d)).count();
        Ok(count as u64)
    }

    async fn estimated_document_count(&self) -> FolioResult<u64> {
        Ok(self.len() as u64)
    }

    async fn aggregate(&self, pipeline: &[Stage]) -> FolioResult<Vec<Document>> {
        let input = self.docs.read().clone();
        debug!(stages = pipeline.len(), input = input.len(), "Running in-memory pipeline");
        Ok(run_pipeline(input, pipeline, &self.id_field))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, doc: Document) -> FolioResult<Document> {
        let mut docs = self.docs.write();
        let doc = self.prepare_insert(&docs, doc)?;
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn insert_many(&self, batch: Vec<Document>) -> FolioResult<Vec<Document>> {
        let mut docs = self.docs.write();
        let mut inserted = Vec::with_capacity(batch.len());
        for doc in batch {
            let combined: Vec<Document> = docs.iter().chain(inserted.iter()).cloned().collect();
            inserted.push(self.prepare_insert(&combined, doc)?);
        }
        docs.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn update_one(&self, filter: &Filter, patch: &Document) -> FolioResult<Option<Document>> {
        let mut docs = self.docs.write();
        Ok(docs.iter_mut().find(|d| filter.matches(d)).map(|doc| {
            self.apply_patch(doc, patch);
            doc.clone()
        }))
    }

    async fn update_many(&self, filter: &Filter, patch: &Document) -> FolioResult<u64> {
        let mut docs = self.docs.write();
        let mut changed = 0;
        for doc in docs.iter_mut().filter(|d| filter.matches(d)) {
            self.apply_patch(doc, patch);
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_one(&self, filter: &Filter) -> FolioResult<bool> {
        let mut docs = self.docs.write();
        match docs.iter().position(|d| filter.matches(d)) {
            Some(pos) => {
                docs.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_many(&self, filter: &Filter) -> FolioResult<u64> {
        let mut docs = self.docs.write();
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn run_pipeline(mut docs: Vec<Document>, stages: &[Stage], id_field: &str) -> Vec<Document> {
    for stage in stages {
        docs = match stage {
            Stage::Match(filter) => docs.into_iter().filter(|d| filter.matches(d)).collect(),
            Stage::Sort(sort) => {
                docs.sort_by(|a, b| sort.compare(a, b));
                docs
            }
            Stage::Skip(n) => docs.into_iter().skip(to_usize(*n)).collect(),
            Stage::Limit(n) => docs.into_iter().take(to_usize(*n)).collect(),
            Stage::Project(projection) => docs
                .iter()
                .map(|d| projection.apply(d, id_field))
                .collect(),
            Stage::Group { by, accumulators } => group(&docs, by.as_deref(), accumulators),
            Stage::Count(name) => {
                if docs.is_empty() {
                    Vec::new()
                } else {
                    let mut out = Map::new();
                    out.insert(name.clone(), Value::from(docs.len() as u64));
                    vec![out]
                }
            }
            Stage::Facet(facets) => {
                let mut out = Map::new();
                for (name, sub) in facets {
                    let rows = run_pipeline(docs.clone(), sub, id_field);
                    out.insert(
                        name.clone(),
                        Value::Array(rows.into_iter().map(Value::Object).collect()),
                    );
                }
                vec![out]
            }
        };
    }
    docs
}

fn group(docs: &[Document], by: Option<&str>, accumulators: &[(String, Accumulator)]) -> Vec<Document> {
    let mut groups: Vec<(Value, Vec<&Document>)> = Vec::new();
    for doc in docs {
        let key = by.map_or(Value::Null, |field| field_or_null(doc, field));
        match groups.iter_mut().find(|(k, _)| values_equal(k, &key)) {
            Some((_, members)) => members.push(doc),
            None => groups.push((key, vec![doc])),
        }
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let mut out = Map::new();
            out.insert(GROUP_KEY.to_string(), key);
            for (name, accumulator) in accumulators {
                out.insert(name.clone(), accumulate(accumulator, &members));
            }
            out
        })
        .collect()
}

fn accumulate(accumulator: &Accumulator, members: &[&Document]) -> Value {
    let present = |field: &str| -> Vec<Value> {
        members
            .iter()
            .map(|d| field_or_null(d, field))
            .filter(|v| !v.is_null())
            .collect()
    };

    match accumulator {
        Accumulator::Count => Value::from(members.len() as u64),
        Accumulator::Sum(field) => sum(&present(field)),
        Accumulator::Avg(field) => {
            let numbers: Vec<f64> = present(field).iter().filter_map(Value::as_f64).collect();
            if numbers.is_empty() {
                Value::Null
            } else {
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                Number::from_f64(mean).map_or(Value::Null, Value::Number)
            }
        }
        Accumulator::Min(field) => present(field)
            .into_iter()
            .min_by(compare_values)
            .unwrap_or(Value::Null),
        Accumulator::Max(field) => present(field)
            .into_iter()
            .max_by(compare_values)
            .unwrap_or(Value::Null),
        Accumulator::First(field) => members
            .first()
            .map_or(Value::Null, |d| field_or_null(d, field)),
    }
}

/// Sums numeric values, staying integral while every input is an integer.
fn sum(values: &[Value]) -> Value {
    let numbers: Vec<&Number> = values
        .iter()
        .filter_map(|v| match v {
            Value::Number(n) => Some(n),
            _ => None,
        })
        .collect();

    let integral: Option<i64> = numbers
        .iter()
        .try_fold(0i64, |acc, n| n.as_i64().and_then(|n| acc.checked_add(n)));
    if let Some(total) = integral {
        return Value::from(total);
    }
    let total: f64 = numbers.iter().filter_map(|n| n.as_f64()).sum();
    Number::from_f64(total).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Projection, SortSpec};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn orders() -> MemoryStore {
        let rows = [
            ("o1", "A", 10),
            ("o2", "B", 5),
            ("o3", "A", 7),
            ("o4", "C", 1),
            ("o5", "B", 2),
        ];
        MemoryStore::with_documents(
            "_id",
            rows.iter()
                .map(|(id, customer, amount)| doc(json!({"_id": id, "customer": customer, "amount": amount})))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_find_sorts_skips_limits_and_projects() {
        let store = orders();
        let query = FindQuery {
            sort: SortSpec::new().desc("amount"),
            skip: 1,
            limit: Some(2),
            projection: Some(Projection::include(["amount"])),
            ..FindQuery::default()
        };

        let docs = store.find(&query).await.unwrap();
        assert_eq!(
            docs.into_iter().map(Value::Object).collect::<Vec<_>>(),
            vec![json!({"_id": "o3", "amount": 7}), json!({"_id": "o2", "amount": 5})]
        );
    }

    #[tokio::test]
    async fn test_counts() {
        let store = orders();
        assert_eq!(store.count_documents(&Filter::eq("customer", "A")).await.unwrap(), 2);
        assert_eq!(store.estimated_document_count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_rejects_duplicates() {
        let store = MemoryStore::default();
        let created = store.insert_one(doc(json!({"title": "a"}))).await.unwrap();
        let id = created.get("_id").cloned().unwrap();
        assert!(id.is_string());

        let err = store
            .insert_one(doc(json!({"_id": id, "title": "b"})))
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Store(_)));
        assert_eq!(store.len(), 1);

        let err = store
            .insert_many(vec![doc(json!({"_id": "x"})), doc(json!({"_id": "x"}))])
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Store(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = orders();
        let updated = store
            .update_one(&Filter::eq("_id", "o1"), &doc(json!({"_id": "hijack", "meta.flag": true})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("_id"), Some(&json!("o1")));
        assert_eq!(updated.get("meta"), Some(&json!({"flag": true})));

        assert_eq!(
            store
                .update_many(&Filter::eq("customer", "B"), &doc(json!({"vip": true})))
                .await
                .unwrap(),
            2
        );
        assert!(store.delete_one(&Filter::eq("_id", "o4")).await.unwrap());
        assert!(!store.delete_one(&Filter::eq("_id", "o4")).await.unwrap());
        assert_eq!(store.delete_many(&Filter::eq("customer", "B")).await.unwrap(), 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_group_accumulators() {
        let store = orders();
        let rows = store
            .aggregate(&[
                Stage::Group {
                    by: Some("customer".to_string()),
                    accumulators: vec![
                        ("orders".to_string(), Accumulator::Count),
                        ("total".to_string(), Accumulator::Sum("amount".to_string())),
                        ("largest".to_string(), Accumulator::Max("amount".to_string())),
                    ],
                },
                Stage::Sort(SortSpec::new().desc("total")),
            ])
            .await
            .unwrap();

        assert_eq!(
            rows.into_iter().map(Value::Object).collect::<Vec<_>>(),
            vec![
                json!({"_id": "A", "orders": 2, "total": 17, "largest": 10}),
                json!({"_id": "B", "orders": 2, "total": 7, "largest": 5}),
                json!({"_id": "C", "orders": 1, "total": 1, "largest": 1}),
            ]
        );
    }

    #[tokio::test]
    async fn test_count_and_facet() {
        let store = orders();
        let rows = store
            .aggregate(&[
                Stage::Match(Filter::eq("customer", "Z")),
                Stage::Facet(vec![
                    ("docs".to_string(), vec![Stage::Limit(10)]),
                    ("total".to_string(), vec![Stage::Count("count".to_string())]),
                ]),
            ])
            .await
            .unwrap();
        assert_eq!(Value::Object(rows[0].clone()), json!({"docs": [], "total": []}));

        let rows = store.aggregate(&[Stage::Count("n".to_string())]).await.unwrap();
        assert_eq!(Value::Object(rows[0].clone()), json!({"n": 5}));
    }

    #[test]
    fn test_sum_falls_back_to_float() {
        assert_eq!(sum(&[json!(1), json!(2)]), json!(3));
        assert_eq!(sum(&[json!(1), json!(0.5)]), json!(1.5));
        assert_eq!(sum(&[]), json!(0));
    }
}
