//! Mutation interceptor
//!
//! [`AuditInterceptor`] is the [`MutationHook`] that turns pipeline mutations
//! into audit records. Per operation:
//!
//! - **after-create**: `new_values` from the inserted row
//! - **before-update**: reads the live row through the side source and
//!   stashes its snapshot in the scope's context
//! - **after-update**: `old_values` from the stash; when nothing was
//!   stashed, from the destination the caller passed in, or a re-read
//!   including soft-deleted rows when that only names the key;
//!   `new_values` from the returned row
//! - **after-delete**: `old_values` from a re-read including soft-deleted
//!   rows, falling back to the destination object when the row is gone
//!
//! After-hooks only emit when the statement completed without error; a
//! delete that matched nothing is still recorded, with empty `old_values`. Nothing here ever
//! fails the business operation: unresolved targets are skipped, and read or
//! write failures are logged on the `rolegate::audit` target.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::identity::{self, ResolvedTarget};
use super::models::{AuditAction, NewAuditRecord};
use super::snapshot;
use super::store::AuditStore;
use super::AuditContext;
use crate::db::pipeline::{MutationHook, MutationScope, Outcome};

/// Hook that records every audited mutation in an [`AuditStore`]
#[derive(Clone)]
pub struct AuditInterceptor {
    store: Arc<dyn AuditStore>,
}

impl AuditInterceptor {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Resolve the target, skipping unresolved identities and the audit
    /// table itself
    fn target(&self, scope: &MutationScope<'_>, hook: &'static str) -> Option<ResolvedTarget> {
        let Some(target) = identity::resolve(scope) else {
            debug!(target: "rolegate::audit", hook, "Skipping audit: target not resolved");
            return None;
        };

        if target.table == self.store.table_name() {
            debug!(target: "rolegate::audit", hook, table = %target.table, "Skipping audit of audit table");
            return None;
        }

        Some(target)
    }

    /// Re-read a row including soft-deleted ones and snapshot it
    async fn read_image(&self, scope: &MutationScope<'_>, target: &ResolvedTarget) -> String {
        let Some(source) = scope.source() else {
            return String::new();
        };

        match source.fetch(target.record_id, true).await {
            Ok(Some(row)) => snapshot::serialize_value(&row),
            Ok(None) => String::new(),
            Err(e) => {
                warn!(
                    target: "rolegate::audit",
                    table = %target.table,
                    record_id = target.record_id,
                    error = %e,
                    "Failed to read row for audit snapshot"
                );
                String::new()
            },
        }
    }

    async fn emit(
        &self,
        ctx: &AuditContext,
        target: ResolvedTarget,
        action: AuditAction,
        old_values: String,
        new_values: String,
    ) {
        let built = NewAuditRecord::builder()
            .table_name(target.table.as_str())
            .record_id(target.record_id)
            .action(action)
            .old_values(old_values)
            .new_values(new_values)
            .user_id(ctx.actor_user_id().unwrap_or(0))
            .ip(ctx.actor_ip().unwrap_or_default())
            .try_build();

        let record = match built {
            Ok(record) => record,
            Err(reason) => {
                warn!(target: "rolegate::audit", table = %target.table, reason, "Discarding malformed audit record");
                return;
            },
        };

        match self.store.append(record).await {
            Ok(stored) => debug!(
                target: "rolegate::audit",
                audit_id = stored.id,
                table = %stored.table_name,
                record_id = stored.record_id,
                action = %stored.action,
                user_id = stored.user_id,
                "Audit record written"
            ),
            Err(e) => warn!(
                target: "rolegate::audit",
                table = %target.table,
                record_id = target.record_id,
                action = %action,
                error = %e,
                "Failed to write audit record"
            ),
        }
    }
}

#[async_trait]
impl MutationHook for AuditInterceptor {
    async fn after_create(&self, scope: &mut MutationScope<'_>) {
        if scope.outcome() != Outcome::Succeeded {
            return;
        }
        let Some(target) = self.target(scope, "after_create") else {
            return;
        };

        let new_values = scope.dest().map(snapshot::serialize_value).unwrap_or_default();
        self.emit(scope.context(), target, AuditAction::Create, String::new(), new_values)
            .await;
    }

    async fn before_update(&self, scope: &mut MutationScope<'_>) {
        let Some(target) = self.target(scope, "before_update") else {
            return;
        };
        let Some(source) = scope.source() else {
            return;
        };

        match source.fetch(target.record_id, false).await {
            Ok(Some(row)) => {
                let preimage = snapshot::serialize_value(&row);
                if !preimage.is_empty() {
                    let stashed = scope.context().stash_preimage(preimage);
                    scope.set_context(stashed);
                }
            },
            Ok(None) => debug!(
                target: "rolegate::audit",
                table = %target.table,
                record_id = target.record_id,
                "No live row to capture before update"
            ),
            Err(e) => warn!(
                target: "rolegate::audit",
                table = %target.table,
                record_id = target.record_id,
                error = %e,
                "Failed to capture row before update"
            ),
        }
    }

    async fn after_update(&self, scope: &mut MutationScope<'_>) {
        if scope.outcome() != Outcome::Succeeded {
            return;
        }
        let Some(target) = self.target(scope, "after_update") else {
            return;
        };

        let old_values = match (scope.context().preimage(), scope.pre_image()) {
            (Some(stashed), _) => stashed.to_owned(),
            (None, Some(pre)) => snapshot::serialize_value(pre),
            (None, None) => self.read_image(scope, &target).await,
        };
        let new_values = scope.dest().map(snapshot::serialize_value).unwrap_or_default();

        self.emit(scope.context(), target, AuditAction::Update, old_values, new_values)
            .await;
    }

    async fn after_delete(&self, scope: &mut MutationScope<'_>) {
        if scope.outcome() != Outcome::Succeeded {
            return;
        }
        let Some(target) = self.target(scope, "after_delete") else {
            return;
        };

        let mut old_values = self.read_image(scope, &target).await;
        if old_values.is_empty() {
            if let Some(dest) = scope.dest() {
                old_values = snapshot::serialize_value(dest);
            }
        }

        self.emit(scope.context(), target, AuditAction::Delete, old_values, String::new())
            .await;
    }
}
