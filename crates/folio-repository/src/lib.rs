//! # Folio Repository
//!
//! A collection-scoped repository that announces every operation on a
//! typed hook bus:
//!
//! ```text
//! caller
//!   ↓  get_by_id / get_all / create / update / ...
//! Repository ── emit BeforeEvent ──→ LifecycleHook (e.g. cache-aside)
//!   ↓  (unless a hook served the result)
//! DocumentStore / PaginationEngine
//!   ↓
//! Repository ── emit AfterEvent ───→ LifecycleHook
//! ```
//!
//! Hooks share a mutable [`HookContext`] per call, which is how a hook
//! short-circuits a read or tells its own `after` handler what it did in
//! `before`.

pub mod hooks;
pub mod query;
pub mod repository;

pub use hooks::{AfterEvent, BeforeEvent, HookBus, HookContext, HookResult, LifecycleHook, Operation};
pub use query::{ListMode, ListQuery, ReadOptions};
pub use repository::Repository;
