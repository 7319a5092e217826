//! Server records: the inventory resource the authorization layer protects.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inventra_core::{DomainError, DomainResult, ServerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: ServerId,
    pub name: String,
    pub ip_address: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerInput {
    pub name: String,
    pub ip_address: String,
    #[serde(default)]
    pub description: String,
}

impl ServerInput {
    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.ip_address.parse::<std::net::IpAddr>().is_err() {
            return Err(DomainError::validation("ip_address must be an IP address"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryServerStore {
    inner: RwLock<HashMap<ServerId, ServerRecord>>,
}

impl InMemoryServerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> DomainResult<Vec<ServerRecord>> {
        let map = self.read()?;
        let mut servers: Vec<ServerRecord> = map.values().cloned().collect();
        servers.sort_by_key(|s| s.created_at);
        Ok(servers)
    }

    pub fn get(&self, id: ServerId) -> DomainResult<ServerRecord> {
        self.read()?.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    pub fn create(&self, input: ServerInput) -> DomainResult<ServerRecord> {
        input.validate()?;
        let now = Utc::now();
        let record = ServerRecord {
            id: ServerId::new(),
            name: input.name.trim().to_string(),
            ip_address: input.ip_address,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        self.write()?.insert(record.id, record.clone());
        Ok(record)
    }

    pub fn update(&self, id: ServerId, input: ServerInput) -> DomainResult<ServerRecord> {
        input.validate()?;
        let mut map = self.write()?;
        let record = map.get_mut(&id).ok_or(DomainError::NotFound)?;
        record.name = input.name.trim().to_string();
        record.ip_address = input.ip_address;
        record.description = input.description;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    pub fn delete(&self, id: ServerId) -> DomainResult<()> {
        self.write()?.remove(&id).map(|_| ()).ok_or(DomainError::NotFound)
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, HashMap<ServerId, ServerRecord>>> {
        self.inner
            .read()
            .map_err(|_| DomainError::unavailable("server store lock poisoned"))
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<ServerId, ServerRecord>>> {
        self.inner
            .write()
            .map_err(|_| DomainError::unavailable("server store lock poisoned"))
    }
}
