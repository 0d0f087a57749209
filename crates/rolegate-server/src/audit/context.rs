//! Request-scoped actor context
//!
//! [`AuditContext`] carries who is acting (user id) and from where (client IP)
//! alongside a unit of work, without widening any data-access signature. The
//! actor-context middleware inserts one into the request extensions; handlers
//! pull it back out with the [`FromRequestParts`] extractor and hand it to the
//! [`Pipeline`](crate::db::pipeline::Pipeline).
//!
//! The context also has a transient slot for the pre-image captured by the
//! before-update hook. All mutators return a derived copy, so an operation that
//! stashes a snapshot never leaks it into another operation's context.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Acting principal and origin for the current unit of work
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditContext {
    user_id: Option<u64>,
    ip: Option<String>,
    preimage: Option<String>,
}

impl AuditContext {
    /// Context with no actor and no origin
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Derive a context attributed to `user_id` coming from `ip`.
    ///
    /// A zero user id or an empty IP is stored as absent.
    pub fn with_actor(&self, user_id: Option<u64>, ip: Option<&str>) -> Self {
        Self {
            user_id: user_id.filter(|id| *id > 0),
            ip: ip.filter(|ip| !ip.is_empty()).map(str::to_owned),
            preimage: self.preimage.clone(),
        }
    }

    pub fn actor_user_id(&self) -> Option<u64> {
        self.user_id
    }

    pub fn actor_ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// Derive a context carrying `snapshot` as the pending pre-image
    pub fn stash_preimage(&self, snapshot: impl Into<String>) -> Self {
        Self {
            user_id: self.user_id,
            ip: self.ip.clone(),
            preimage: Some(snapshot.into()),
        }
    }

    /// Pre-image stashed by a before-update hook, if any
    pub fn preimage(&self) -> Option<&str> {
        self.preimage.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuditContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<AuditContext>().cloned().unwrap_or_default())
    }
}
