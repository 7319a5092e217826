use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use inventra_auth::{Role, RoleLookupError, RoleStore, bootstrap_roles};

/// In-memory role table keyed by lowercased role name.
#[derive(Debug)]
pub struct InMemoryRoleStore {
    inner: RwLock<HashMap<String, Role>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// A store holding the bootstrap roles and their canonical grants.
    pub fn seeded() -> Self {
        let store = Self::new();
        for role in bootstrap_roles() {
            store.upsert(role);
        }
        store
    }

    /// Insert or administratively redefine a role.
    pub fn upsert(&self, role: Role) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(role.name.key(), role);
        }
    }

    pub fn remove(&self, name: &str) -> Option<Role> {
        self.inner.write().ok()?.remove(&name.to_ascii_lowercase())
    }
}

impl Default for InMemoryRoleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn role_by_name(&self, name: &str) -> Result<Option<Role>, RoleLookupError> {
        let map = self
            .inner
            .read()
            .map_err(|_| RoleLookupError("role table lock poisoned".to_string()))?;
        Ok(map.get(&name.to_ascii_lowercase()).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, RoleLookupError> {
        let map = self
            .inner
            .read()
            .map_err(|_| RoleLookupError("role table lock poisoned".to_string()))?;
        let mut roles: Vec<Role> = map.values().cloned().collect();
        roles.sort_by_key(|r| r.name.key());
        Ok(roles)
    }
}
