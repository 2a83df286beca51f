//! Permission collaborator contracts.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// The requesting user. Id 0 is the anonymous user; only users with a
/// positive id pass the dispatcher's validity gate.
#[derive(Clone, Debug, Default)]
pub struct UserHandle {
    pub id: i64,
    pub name: String,
}

impl UserHandle {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn named(id: i64, name: &str) -> Self {
        UserHandle {
            id,
            name: name.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.id > 0
    }
}

/// Per-request permission answers. The dispatcher caches each component
/// verdict for the lifetime of the request, so implementations may hit a
/// backing store on every call.
pub trait PermissionOracle: Send + Sync {
    fn current_user(&self) -> UserHandle;

    /// May the current user use `component` of controller `kind`?
    fn user_has_permission(&self, kind: &str, component: &str) -> bool;
}

/// Resolves the permission oracle for one request from its auth token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: Option<&str>) -> Arc<dyn PermissionOracle>;
}

/// Oracle with a fixed user and an explicit grant set. Useful for demos and
/// tests.
pub struct StaticOracle {
    user: UserHandle,
    allow_all: bool,
    granted: HashSet<(String, String)>,
}

impl StaticOracle {
    /// Grants every component to `user`.
    pub fn allowing_all(user: UserHandle) -> Self {
        StaticOracle {
            user,
            allow_all: true,
            granted: HashSet::new(),
        }
    }

    /// Grants only the listed (kind, component) pairs to `user`.
    pub fn with_grants<'a>(
        user: UserHandle,
        grants: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        StaticOracle {
            user,
            allow_all: false,
            granted: grants
                .into_iter()
                .map(|(kind, component)| (kind.to_lowercase(), component.to_lowercase()))
                .collect(),
        }
    }
}

impl PermissionOracle for StaticOracle {
    fn current_user(&self) -> UserHandle {
        self.user.clone()
    }

    fn user_has_permission(&self, kind: &str, component: &str) -> bool {
        self.allow_all
            || self
                .granted
                .contains(&(kind.to_lowercase(), component.to_lowercase()))
    }
}

/// Authenticator that hands every request the same oracle; a missing token
/// yields the anonymous oracle instead.
pub struct StaticAuthenticator {
    oracle: Arc<dyn PermissionOracle>,
    require_token: bool,
}

impl StaticAuthenticator {
    pub fn new(oracle: Arc<dyn PermissionOracle>) -> Self {
        StaticAuthenticator {
            oracle,
            require_token: false,
        }
    }

    /// Only hand out the oracle when the request carries any token at all.
    pub fn require_token(mut self) -> Self {
        self.require_token = true;
        self
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: Option<&str>) -> Arc<dyn PermissionOracle> {
        if self.require_token && token.is_none() {
            return Arc::new(StaticOracle::allowing_all(UserHandle::anonymous()));
        }
        self.oracle.clone()
    }
}
