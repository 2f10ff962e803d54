use super::{GroupNameResolver, MessageStore, StoreError, StoredMessage};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// In-memory message log
/// Uses a Vec wrapped in Arc<RwLock<>> so it can be shared with the server tasks
#[derive(Clone, Default)]
pub struct MemoryMessageStore {
    messages: Arc<RwLock<Vec<StoredMessage>>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<StoredMessage>) -> Self {
        Self {
            messages: Arc::new(RwLock::new(messages)),
        }
    }

    pub async fn insert(&self, message: StoredMessage) {
        self.messages.write().await.push(message);
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn list_all_messages(
        &self,
        tenant: Option<&str>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let messages = self.messages.read().await;
        let snapshot: Vec<StoredMessage> = messages
            .iter()
            .filter(|m| tenant.is_none() || m.tenant.as_deref() == tenant)
            .cloned()
            .collect();

        debug!(
            tenant = tenant.unwrap_or("*"),
            count = snapshot.len(),
            "listed messages from memory store"
        );
        Ok(snapshot)
    }
}

/// In-memory conversation id → group name directory
#[derive(Clone, Default)]
pub struct MemoryGroupDirectory {
    names: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names(names: HashMap<String, String>) -> Self {
        Self {
            names: Arc::new(RwLock::new(names)),
        }
    }

    pub async fn set_name(&self, conversation_id: &str, name: &str) {
        self.names
            .write()
            .await
            .insert(conversation_id.to_string(), name.to_string());
    }
}

#[async_trait]
impl GroupNameResolver for MemoryGroupDirectory {
    async fn resolve_name(&self, conversation_id: &str) -> String {
        self.names
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct SeedData {
    #[serde(default)]
    messages: Vec<StoredMessage>,
    #[serde(default)]
    groups: HashMap<String, String>,
}

/// Loads a JSON seed file of the form `{"messages": [...], "groups": {"id": "name"}}`.
pub async fn load_seed_file(
    path: impl AsRef<Path>,
) -> Result<(MemoryMessageStore, MemoryGroupDirectory), StoreError> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))?;
    let seed: SeedData = serde_json::from_str(&contents)
        .map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))?;

    info!(
        path = %path.display(),
        messages = seed.messages.len(),
        groups = seed.groups.len(),
        "loaded memory store seed"
    );

    Ok((
        MemoryMessageStore::with_messages(seed.messages),
        MemoryGroupDirectory::with_names(seed.groups),
    ))
}
