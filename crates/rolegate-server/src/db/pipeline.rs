//! Mutation pipeline
//!
//! Every create, update and delete issued by the feature handlers goes through
//! a [`Pipeline`]. The pipeline owns the registered [`MutationHook`]s and, for
//! each operation, builds one [`MutationScope`] that is handed to the
//! before-hook and then to the after-hook. That scope is the only channel
//! between the two, so concurrent operations never share state.
//!
//! The business statement itself is supplied by the caller as a future. It
//! runs on whatever executor the caller chose (the pool or an open
//! transaction). Hooks that need to read rows do so through a
//! [`RecordSource`] bound to the pipeline's own side pool, which is never part
//! of the caller's transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! let user = pipeline
//!     .create(&ctx, async {
//!         sqlx::query_as::<_, User>("INSERT INTO users (...) VALUES (...) RETURNING *")
//!             .fetch_one(&pool)
//!             .await
//!     })
//!     .await?;
//! ```

use std::{future::Future, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::audit::AuditContext;

/// Table metadata an entity exposes to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Backing table name
    pub table: &'static str,
    /// Primary-key column, also the field name in the serialized entity
    pub primary_key: &'static str,
    /// Whether rows carry a `deleted_at` soft-delete marker
    pub soft_delete: bool,
}

/// A persisted type the pipeline can mutate and re-read
pub trait Entity: Serialize + Send + Sync + Unpin + 'static {
    fn schema() -> &'static Schema;
}

/// Kind of mutation flowing through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// How the business statement ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Statement has not run yet
    Pending,
    /// Statement completed without error
    Succeeded,
    /// Statement returned an error
    Failed,
}

/// Value bound to a statement parameter
///
/// Only used to describe what a statement was bound with, so hooks can
/// recover an identity when no destination object exists.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Text(String),
}

impl SqlParam {
    /// The parameter as a record identity: an integer strictly above zero
    pub fn as_identity(&self) -> Option<u64> {
        let id = match *self {
            SqlParam::I8(v) => u64::try_from(v).ok(),
            SqlParam::I16(v) => u64::try_from(v).ok(),
            SqlParam::I32(v) => u64::try_from(v).ok(),
            SqlParam::I64(v) => u64::try_from(v).ok(),
            SqlParam::U8(v) => Some(u64::from(v)),
            SqlParam::U16(v) => Some(u64::from(v)),
            SqlParam::U32(v) => Some(u64::from(v)),
            SqlParam::U64(v) => Some(v),
            SqlParam::Null | SqlParam::Bool(_) | SqlParam::Text(_) => None,
        };
        id.filter(|id| *id > 0)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::I64(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::I32(v)
    }
}

impl From<u64> for SqlParam {
    fn from(v: u64) -> Self {
        SqlParam::U64(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_owned())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

/// Reads a single row by identity, outside the caller's transaction
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the row with `record_id` as JSON.
    ///
    /// Soft-deleted rows are only returned when `include_deleted` is set.
    async fn fetch(&self, record_id: u64, include_deleted: bool)
        -> Result<Option<Value>, sqlx::Error>;
}

/// [`RecordSource`] reading `E`'s table through a dedicated pool
pub struct PgRecordSource<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PgRecordSource<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E> RecordSource for PgRecordSource<E>
where
    E: Entity + for<'r> FromRow<'r, PgRow>,
{
    async fn fetch(
        &self,
        record_id: u64,
        include_deleted: bool,
    ) -> Result<Option<Value>, sqlx::Error> {
        let Ok(id) = i64::try_from(record_id) else {
            return Ok(None);
        };

        let schema = E::schema();
        let live_only = if schema.soft_delete && !include_deleted {
            " AND deleted_at IS NULL"
        } else {
            ""
        };
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1{}",
            schema.table, schema.primary_key, live_only
        );

        let row = sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|entity| serde_json::to_value(entity).ok()))
    }
}

/// State of one operation, shared by its before- and after-hooks
pub struct MutationScope<'a> {
    kind: MutationKind,
    schema: Option<&'static Schema>,
    table: Option<String>,
    dest: Option<Value>,
    pre_dest: Option<Value>,
    params: Vec<SqlParam>,
    source: Option<&'a dyn RecordSource>,
    context: AuditContext,
    outcome: Outcome,
}

impl<'a> MutationScope<'a> {
    pub fn new(kind: MutationKind, context: AuditContext) -> Self {
        Self {
            kind,
            schema: None,
            table: None,
            dest: None,
            pre_dest: None,
            params: Vec::new(),
            source: None,
            context,
            outcome: Outcome::Pending,
        }
    }

    pub fn with_schema(mut self, schema: &'static Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Name the target table when no schema metadata is available
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_dest(mut self, dest: Value) -> Self {
        self.dest = Some(dest);
        self
    }

    pub fn with_params(mut self, params: Vec<SqlParam>) -> Self {
        self.params = params;
        self
    }

    pub fn with_source(mut self, source: &'a dyn RecordSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn schema(&self) -> Option<&'static Schema> {
        self.schema
    }

    pub fn table_override(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Destination object: the target before the statement, the returned
    /// row after it
    pub fn dest(&self) -> Option<&Value> {
        self.dest.as_ref()
    }

    /// Destination as it was before the statement ran, when it carries more
    /// than the primary key
    pub fn pre_image(&self) -> Option<&Value> {
        let key = self.schema.map_or("id", |s| s.primary_key);
        self.pre_dest
            .as_ref()
            .filter(|dest| dest.as_object().is_some_and(|o| o.keys().any(|k| k != key)))
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn source(&self) -> Option<&'a dyn RecordSource> {
        self.source
    }

    pub fn context(&self) -> &AuditContext {
        &self.context
    }

    pub fn set_context(&mut self, context: AuditContext) {
        self.context = context;
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    fn settle<T, Er>(&mut self, result: &Result<T, Er>) {
        self.outcome = match result {
            Ok(_) => Outcome::Succeeded,
            Err(_) => Outcome::Failed,
        };
    }

    fn replace_dest<T: Serialize>(&mut self, row: &T) {
        match serde_json::to_value(row) {
            Ok(value) => self.dest = Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode returned row");
                self.dest = None;
            },
        }
    }
}

/// Extension points around a mutation
///
/// After-hooks always run once the statement has settled; implementations
/// check [`MutationScope::outcome`] to decide whether to act.
#[async_trait]
pub trait MutationHook: Send + Sync {
    async fn after_create(&self, _scope: &mut MutationScope<'_>) {}

    async fn before_update(&self, _scope: &mut MutationScope<'_>) {}

    async fn after_update(&self, _scope: &mut MutationScope<'_>) {}

    async fn after_delete(&self, _scope: &mut MutationScope<'_>) {}
}

/// Persistence boundary for audited mutations
#[derive(Clone)]
pub struct Pipeline {
    side_pool: PgPool,
    hooks: Vec<Arc<dyn MutationHook>>,
}

impl Pipeline {
    /// Create a pipeline whose side reads go through `side_pool`
    pub fn new(side_pool: PgPool) -> Self {
        Self {
            side_pool,
            hooks: Vec::new(),
        }
    }

    /// Register a hook; hooks run in registration order
    pub fn with_hook(mut self, hook: Arc<dyn MutationHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Insert a row; `statement` resolves to the inserted entity
    pub async fn create<E, Er, Fut>(&self, ctx: &AuditContext, statement: Fut) -> Result<E, Er>
    where
        E: Entity,
        Fut: Future<Output = Result<E, Er>> + Send,
    {
        let scope = MutationScope::new(MutationKind::Create, ctx.clone()).with_schema(E::schema());
        self.run_create(scope, statement).await
    }

    /// Update `target`; `statement` resolves to the row as written
    pub async fn update<E, Er, Fut>(
        &self,
        ctx: &AuditContext,
        target: &E,
        statement: Fut,
    ) -> Result<E, Er>
    where
        E: Entity + for<'r> FromRow<'r, PgRow>,
        Fut: Future<Output = Result<E, Er>> + Send,
    {
        let source = PgRecordSource::<E>::new(self.side_pool.clone());
        let mut scope = MutationScope::new(MutationKind::Update, ctx.clone())
            .with_schema(E::schema())
            .with_source(&source);
        scope.replace_dest(target);
        self.run_update(scope, statement).await
    }

    /// Update the row with primary key `id` without loading it first
    pub async fn update_by_id<E, Er, Fut>(
        &self,
        ctx: &AuditContext,
        id: u64,
        statement: Fut,
    ) -> Result<E, Er>
    where
        E: Entity + for<'r> FromRow<'r, PgRow>,
        Fut: Future<Output = Result<E, Er>> + Send,
    {
        let schema = E::schema();
        let source = PgRecordSource::<E>::new(self.side_pool.clone());
        let mut key = serde_json::Map::new();
        key.insert(schema.primary_key.to_owned(), Value::from(id));

        let scope = MutationScope::new(MutationKind::Update, ctx.clone())
            .with_schema(schema)
            .with_dest(Value::Object(key))
            .with_source(&source);
        self.run_update(scope, statement).await
    }

    /// Delete `target`; `statement` resolves to the number of rows affected
    pub async fn delete<E, Er, Fut>(
        &self,
        ctx: &AuditContext,
        target: &E,
        statement: Fut,
    ) -> Result<u64, Er>
    where
        E: Entity + for<'r> FromRow<'r, PgRow>,
        Fut: Future<Output = Result<u64, Er>> + Send,
    {
        let source = PgRecordSource::<E>::new(self.side_pool.clone());
        let mut scope = MutationScope::new(MutationKind::Delete, ctx.clone())
            .with_schema(E::schema())
            .with_source(&source);
        scope.replace_dest(target);
        self.run_delete(scope, statement).await
    }

    /// Delete by primary key with no destination object
    pub async fn delete_by_id<E, Er, Fut>(
        &self,
        ctx: &AuditContext,
        id: i64,
        statement: Fut,
    ) -> Result<u64, Er>
    where
        E: Entity + for<'r> FromRow<'r, PgRow>,
        Fut: Future<Output = Result<u64, Er>> + Send,
    {
        self.delete_with_params::<E, Er, Fut>(ctx, vec![SqlParam::I64(id)], statement)
            .await
    }

    /// Delete with a statement bound to `params`; the first positive
    /// integer parameter identifies the row
    pub async fn delete_with_params<E, Er, Fut>(
        &self,
        ctx: &AuditContext,
        params: Vec<SqlParam>,
        statement: Fut,
    ) -> Result<u64, Er>
    where
        E: Entity + for<'r> FromRow<'r, PgRow>,
        Fut: Future<Output = Result<u64, Er>> + Send,
    {
        let source = PgRecordSource::<E>::new(self.side_pool.clone());
        let scope = MutationScope::new(MutationKind::Delete, ctx.clone())
            .with_schema(E::schema())
            .with_params(params)
            .with_source(&source);
        self.run_delete(scope, statement).await
    }

    /// Drive a create through an explicitly built scope
    pub async fn run_create<T, Er, Fut>(
        &self,
        mut scope: MutationScope<'_>,
        statement: Fut,
    ) -> Result<T, Er>
    where
        T: Serialize,
        Fut: Future<Output = Result<T, Er>>,
    {
        let result = statement.await;
        scope.settle(&result);
        if let Ok(row) = &result {
            scope.replace_dest(row);
        }

        for hook in &self.hooks {
            hook.after_create(&mut scope).await;
        }
        result
    }

    /// Drive an update through an explicitly built scope
    pub async fn run_update<T, Er, Fut>(
        &self,
        mut scope: MutationScope<'_>,
        statement: Fut,
    ) -> Result<T, Er>
    where
        T: Serialize,
        Fut: Future<Output = Result<T, Er>>,
    {
        scope.pre_dest = scope.dest.clone();
        for hook in &self.hooks {
            hook.before_update(&mut scope).await;
        }

        let result = statement.await;
        scope.settle(&result);
        if let Ok(row) = &result {
            scope.replace_dest(row);
        }

        for hook in &self.hooks {
            hook.after_update(&mut scope).await;
        }
        result
    }

    /// Drive a delete through an explicitly built scope
    pub async fn run_delete<Er, Fut>(
        &self,
        mut scope: MutationScope<'_>,
        statement: Fut,
    ) -> Result<u64, Er>
    where
        Fut: Future<Output = Result<u64, Er>>,
    {
        let result = statement.await;
        scope.settle(&result);

        for hook in &self.hooks {
            hook.after_delete(&mut scope).await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, Outcome, Option<Value>)>>,
    }

    impl Recorder {
        async fn push(&self, name: &str, scope: &MutationScope<'_>) {
            self.events
                .lock()
                .await
                .push((name.to_string(), scope.outcome(), scope.dest().cloned()));
        }

        async fn events(&self) -> Vec<(String, Outcome, Option<Value>)> {
            self.events.lock().await.clone()
        }
    }

    #[async_trait]
    impl MutationHook for Recorder {
        async fn after_create(&self, scope: &mut MutationScope<'_>) {
            self.push("after_create", scope).await;
        }

        async fn before_update(&self, scope: &mut MutationScope<'_>) {
            self.push("before_update", scope).await;
        }

        async fn after_update(&self, scope: &mut MutationScope<'_>) {
            self.push("after_update", scope).await;
        }

        async fn after_delete(&self, scope: &mut MutationScope<'_>) {
            self.push("after_delete", scope).await;
        }
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/rolegate_unused")
            .unwrap()
    }

    fn pipeline_with(recorder: Arc<Recorder>) -> Pipeline {
        Pipeline::new(lazy_pool()).with_hook(recorder)
    }

    #[test]
    fn test_sql_param_identity() {
        assert_eq!(SqlParam::I64(5).as_identity(), Some(5));
        assert_eq!(SqlParam::U8(9).as_identity(), Some(9));
        assert_eq!(SqlParam::I32(-3).as_identity(), None);
        assert_eq!(SqlParam::U64(0).as_identity(), None);
        assert_eq!(SqlParam::Text("12".into()).as_identity(), None);
        assert_eq!(SqlParam::Null.as_identity(), None);
    }

    #[tokio::test]
    async fn test_create_replaces_dest_with_returned_row() {
        let recorder = Arc::new(Recorder::default());
        let pipeline = pipeline_with(recorder.clone());

        let scope = MutationScope::new(MutationKind::Create, AuditContext::anonymous())
            .with_table("widgets");
        let row: Result<Value, sqlx::Error> = pipeline
            .run_create(scope, async { Ok(json!({"id": 4, "name": "w"})) })
            .await;
        assert!(row.is_ok());

        let events = recorder.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "after_create");
        assert_eq!(events[0].1, Outcome::Succeeded);
        assert_eq!(events[0].2, Some(json!({"id": 4, "name": "w"})));
    }

    #[tokio::test]
    async fn test_update_runs_before_and_after_hooks_in_order() {
        let recorder = Arc::new(Recorder::default());
        let pipeline = pipeline_with(recorder.clone());

        let scope = MutationScope::new(MutationKind::Update, AuditContext::anonymous())
            .with_table("widgets")
            .with_dest(json!({"id": 4}));
        let _: Result<Value, sqlx::Error> = pipeline
            .run_update(scope, async { Ok(json!({"id": 4, "name": "after"})) })
            .await;

        let events = recorder.events().await;
        let names: Vec<_> = events.iter().map(|e| e.0.as_str()).collect();
        assert_eq!(names, vec!["before_update", "after_update"]);
        assert_eq!(events[0].1, Outcome::Pending);
        assert_eq!(events[0].2, Some(json!({"id": 4})));
        assert_eq!(events[1].2, Some(json!({"id": 4, "name": "after"})));
    }

    #[tokio::test]
    async fn test_failed_statement_is_reported_to_hooks() {
        let recorder = Arc::new(Recorder::default());
        let pipeline = pipeline_with(recorder.clone());

        let scope = MutationScope::new(MutationKind::Update, AuditContext::anonymous())
            .with_table("widgets")
            .with_dest(json!({"id": 4}));
        let result: Result<Value, &str> = pipeline.run_update(scope, async { Err("boom") }).await;
        assert_eq!(result, Err("boom"));

        let events = recorder.events().await;
        assert_eq!(events[1].1, Outcome::Failed);
        // Destination still describes the target, not a returned row.
        assert_eq!(events[1].2, Some(json!({"id": 4})));
    }

    /// Captures what `after_update` sees as the pre-statement image
    #[derive(Default)]
    struct PreImage(Mutex<Option<Value>>);

    #[async_trait]
    impl MutationHook for PreImage {
        async fn after_update(&self, scope: &mut MutationScope<'_>) {
            *self.0.lock().await = scope.pre_image().cloned();
        }
    }

    #[tokio::test]
    async fn test_update_keeps_destination_from_before_statement() {
        let hook = Arc::new(PreImage::default());
        let pipeline = Pipeline::new(lazy_pool()).with_hook(hook.clone());

        let scope = MutationScope::new(MutationKind::Update, AuditContext::anonymous())
            .with_table("widgets")
            .with_dest(json!({"id": 4, "name": "before"}));
        let _: Result<Value, sqlx::Error> = pipeline
            .run_update(scope, async { Ok(json!({"id": 4, "name": "after"})) })
            .await;

        assert_eq!(*hook.0.lock().await, Some(json!({"id": 4, "name": "before"})));
    }

    #[tokio::test]
    async fn test_key_only_destination_is_not_a_pre_image() {
        let hook = Arc::new(PreImage::default());
        let pipeline = Pipeline::new(lazy_pool()).with_hook(hook.clone());

        let scope = MutationScope::new(MutationKind::Update, AuditContext::anonymous())
            .with_table("widgets")
            .with_dest(json!({"id": 4}));
        let _: Result<Value, sqlx::Error> = pipeline
            .run_update(scope, async { Ok(json!({"id": 4, "name": "after"})) })
            .await;

        assert_eq!(*hook.0.lock().await, None);
    }

    #[tokio::test]
    async fn test_delete_with_no_rows_still_succeeds() {
        let recorder = Arc::new(Recorder::default());
        let pipeline = pipeline_with(recorder.clone());

        let scope = MutationScope::new(MutationKind::Delete, AuditContext::anonymous())
            .with_table("widgets")
            .with_params(vec![SqlParam::I64(9)]);
        let affected: Result<u64, sqlx::Error> =
            pipeline.run_delete(scope, async { Ok(0) }).await;
        assert_eq!(affected.unwrap(), 0);

        let events = recorder.events().await;
        assert_eq!(events[0].0, "after_delete");
        assert_eq!(events[0].1, Outcome::Succeeded);
    }

    #[tokio::test]
    async fn test_hooks_run_in_registration_order() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let pipeline = Pipeline::new(lazy_pool())
            .with_hook(first.clone())
            .with_hook(second.clone());

        let scope = MutationScope::new(MutationKind::Delete, AuditContext::anonymous())
            .with_table("widgets");
        let _: Result<u64, sqlx::Error> = pipeline.run_delete(scope, async { Ok(1) }).await;

        assert_eq!(first.events().await.len(), 1);
        assert_eq!(second.events().await.len(), 1);
    }
}
