//! Typed lifecycle hooks.
//!
//! Every repository operation emits one [`BeforeEvent`] and, once it has a
//! result, one [`AfterEvent`]. The set of operations is closed, so a hook
//! that matches on the events gets compile-time coverage of everything a
//! repository can do.

use crate::query::{ListQuery, ReadOptions};
use async_trait::async_trait;
use folio_core::{Document, DocumentId, Filter, FolioResult, ListResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Repository operations that emit lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    GetById,
    GetByQuery,
    GetAll,
    Create,
    CreateMany,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Self::GetById,
        Self::GetByQuery,
        Self::GetAll,
        Self::Create,
        Self::CreateMany,
        Self::Update,
        Self::UpdateMany,
        Self::Delete,
        Self::DeleteMany,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetById => "getById",
            Self::GetByQuery => "getByQuery",
            Self::GetAll => "getAll",
            Self::Create => "create",
            Self::CreateMany => "createMany",
            Self::Update => "update",
            Self::UpdateMany => "updateMany",
            Self::Delete => "delete",
            Self::DeleteMany => "deleteMany",
        }
    }

    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::GetById | Self::GetByQuery | Self::GetAll)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted before an operation touches the store.
#[derive(Debug, Clone, Copy)]
pub enum BeforeEvent<'a> {
    GetById {
        id: &'a DocumentId,
        options: &'a ReadOptions,
    },
    GetByQuery {
        filter: &'a Filter,
        options: &'a ReadOptions,
    },
    GetAll {
        query: &'a ListQuery,
    },
    Create {
        doc: &'a Document,
    },
    CreateMany {
        docs: &'a [Document],
    },
    Update {
        id: &'a DocumentId,
        patch: &'a Document,
    },
    UpdateMany {
        filter: &'a Filter,
        patch: &'a Document,
    },
    Delete {
        id: &'a DocumentId,
    },
    DeleteMany {
        filter: &'a Filter,
    },
}

impl BeforeEvent<'_> {
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::GetById { .. } => Operation::GetById,
            Self::GetByQuery { .. } => Operation::GetByQuery,
            Self::GetAll { .. } => Operation::GetAll,
            Self::Create { .. } => Operation::Create,
            Self::CreateMany { .. } => Operation::CreateMany,
            Self::Update { .. } => Operation::Update,
            Self::UpdateMany { .. } => Operation::UpdateMany,
            Self::Delete { .. } => Operation::Delete,
            Self::DeleteMany { .. } => Operation::DeleteMany,
        }
    }
}

/// Emitted after an operation, carrying its result.
#[derive(Debug, Clone, Copy)]
pub enum AfterEvent<'a> {
    GetById {
        id: &'a DocumentId,
        options: &'a ReadOptions,
        result: Option<&'a Document>,
    },
    GetByQuery {
        filter: &'a Filter,
        options: &'a ReadOptions,
        result: Option<&'a Document>,
    },
    GetAll {
        query: &'a ListQuery,
        result: &'a ListResult,
    },
    Create {
        doc: &'a Document,
    },
    CreateMany {
        docs: &'a [Document],
    },
    Update {
        id: &'a DocumentId,
        result: Option<&'a Document>,
    },
    UpdateMany {
        filter: &'a Filter,
        modified: u64,
    },
    Delete {
        id: &'a DocumentId,
        deleted: bool,
    },
    DeleteMany {
        filter: &'a Filter,
        deleted: u64,
    },
}

impl AfterEvent<'_> {
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::GetById { .. } => Operation::GetById,
            Self::GetByQuery { .. } => Operation::GetByQuery,
            Self::GetAll { .. } => Operation::GetAll,
            Self::Create { .. } => Operation::Create,
            Self::CreateMany { .. } => Operation::CreateMany,
            Self::Update { .. } => Operation::Update,
            Self::UpdateMany { .. } => Operation::UpdateMany,
            Self::Delete { .. } => Operation::Delete,
            Self::DeleteMany { .. } => Operation::DeleteMany,
        }
    }
}

/// A result a hook can serve in place of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HookResult {
    Document(Document),
    List(ListResult),
}

/// Per-call state shared by every hook of one operation.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// Set by the caller to bypass read-through caching.
    pub skip_cache: bool,
    /// Key computed by a caching hook in `before`, reused in `after`.
    pub cache_key: Option<String>,
    served: Option<HookResult>,
    served_from_cache: bool,
}

impl HookContext {
    #[must_use]
    pub fn new(skip_cache: bool) -> Self {
        Self {
            skip_cache,
            ..Self::default()
        }
    }

    /// Supplies the operation's result from the cache; the store is not
    /// queried.
    pub fn serve_from_cache(&mut self, result: HookResult) {
        self.served = Some(result);
        self.served_from_cache = true;
    }

    #[must_use]
    pub const fn served_from_cache(&self) -> bool {
        self.served_from_cache
    }

    /// Takes the served result. The served-from-cache marker stays set so
    /// `after` hooks can skip re-caching.
    pub fn take_served(&mut self) -> Option<HookResult> {
        self.served.take()
    }
}

/// A participant in the repository lifecycle.
///
/// Both methods default to no-ops. An error returned from a hook aborts
/// the operation and is returned to the caller.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn before(&self, _event: &BeforeEvent<'_>, _ctx: &mut HookContext) -> FolioResult<()> {
        Ok(())
    }

    async fn after(&self, _event: &AfterEvent<'_>, _ctx: &mut HookContext) -> FolioResult<()> {
        Ok(())
    }
}

/// Ordered set of hooks attached to one repository.
#[derive(Default)]
pub struct HookBus {
    hooks: RwLock<Vec<Arc<dyn LifecycleHook>>>,
}

impl HookBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a hook. Hooks run in attachment order.
    pub fn on(&self, hook: Arc<dyn LifecycleHook>) {
        trace!(hook = hook.name(), "Attaching lifecycle hook");
        self.hooks.write().push(hook);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn LifecycleHook>> {
        self.hooks.read().clone()
    }

    pub async fn emit_before(&self, event: &BeforeEvent<'_>, ctx: &mut HookContext) -> FolioResult<()> {
        for hook in self.snapshot() {
            trace!(hook = hook.name(), operation = %event.operation(), "before");
            hook.before(event, ctx).await?;
        }
        Ok(())
    }

    pub async fn emit_after(&self, event: &AfterEvent<'_>, ctx: &mut HookContext) -> FolioResult<()> {
        for hook in self.snapshot() {
            trace!(hook = hook.name(), operation = %event.operation(), "after");
            hook.after(event, ctx).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for HookBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.snapshot().iter().map(|h| h.name().to_string()).collect();
        f.debug_struct("HookBus").field("hooks", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LifecycleHook for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn before(&self, event: &BeforeEvent<'_>, _ctx: &mut HookContext) -> FolioResult<()> {
            self.log.lock().push(format!("{}:before:{}", self.name, event.operation()));
            Ok(())
        }

        async fn after(&self, event: &AfterEvent<'_>, _ctx: &mut HookContext) -> FolioResult<()> {
            self.log.lock().push(format!("{}:after:{}", self.name, event.operation()));
            Ok(())
        }
    }

    struct Veto;

    #[async_trait]
    impl LifecycleHook for Veto {
        fn name(&self) -> &str {
            "veto"
        }

        async fn before(&self, _event: &BeforeEvent<'_>, _ctx: &mut HookContext) -> FolioResult<()> {
            Err(folio_core::FolioError::validation("writes are frozen"))
        }
    }

    #[test]
    fn test_operation_names() {
        let names: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "getById", "getByQuery", "getAll", "create", "createMany", "update", "updateMany",
                "delete", "deleteMany"
            ]
        );
        assert!(Operation::GetAll.is_read());
        assert!(!Operation::DeleteMany.is_read());
    }

    #[tokio::test]
    async fn test_hooks_run_in_attachment_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = HookBus::new();
        bus.on(Arc::new(Recorder { name: "a", log: log.clone() }));
        bus.on(Arc::new(Recorder { name: "b", log: log.clone() }));

        let id = DocumentId::from_string("x");
        let mut ctx = HookContext::default();
        bus.emit_before(&BeforeEvent::Delete { id: &id }, &mut ctx).await.unwrap();
        bus.emit_after(&AfterEvent::Delete { id: &id, deleted: true }, &mut ctx)
            .await
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec!["a:before:delete", "b:before:delete", "a:after:delete", "b:after:delete"]
        );
    }

    #[tokio::test]
    async fn test_hook_error_stops_emission() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = HookBus::new();
        bus.on(Arc::new(Veto));
        bus.on(Arc::new(Recorder { name: "late", log: log.clone() }));

        let doc = Document::new();
        let result = bus
            .emit_before(&BeforeEvent::Create { doc: &doc }, &mut HookContext::default())
            .await;
        assert!(result.is_err());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_served_marker_survives_take() {
        let mut ctx = HookContext::new(false);
        assert!(!ctx.served_from_cache());
        ctx.serve_from_cache(HookResult::Document(Document::new()));
        assert!(ctx.take_served().is_some());
        assert!(ctx.take_served().is_none());
        assert!(ctx.served_from_cache());
    }
}
