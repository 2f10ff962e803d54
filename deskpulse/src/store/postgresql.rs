use super::{GroupNameResolver, MessageStore, StoreError, StoredMessage};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, info, warn};

const LIST_PAGE_QUERY: &str = r#"
    SELECT id, conversation_id, direction, "timestamp", text, sender_name, tenant
    FROM messages
    WHERE id > $1
      AND ($2::TEXT IS NULL OR tenant = $2)
    ORDER BY id
    LIMIT $3
"#;

async fn connect(connection_string: &str) -> Result<Arc<Client>, StoreError> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
        .await
        .map_err(|e| StoreError::Connection(format!("Failed to connect to database: {}", e)))?;

    // Spawn the connection to run in the background
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            warn!("Database connection error: {}", e);
        }
    });

    Ok(Arc::new(client))
}

/// PostgreSQL backed message log
#[derive(Clone)]
pub struct PostgreSQLMessageStore {
    client: Arc<Client>,
    page_size: i64,
    table_verified: Arc<OnceCell<()>>,
}

impl PostgreSQLMessageStore {
    pub async fn new(connection_string: &str, page_size: i64) -> Result<Self, StoreError> {
        Ok(Self {
            client: connect(connection_string).await?,
            page_size: page_size.max(1),
            table_verified: Arc::new(OnceCell::new()),
        })
    }

    /// Ensures the messages table exists (checks once, caches result)
    async fn ensure_ready(&self) -> Result<(), StoreError> {
        self.table_verified
            .get_or_try_init(|| async {
                let row = self
                    .client
                    .query_one(
                        "SELECT EXISTS (
                            SELECT FROM pg_tables
                            WHERE tablename = 'messages'
                        )",
                        &[],
                    )
                    .await
                    .map_err(|e| {
                        StoreError::Query(format!("Failed to verify table existence: {}", e))
                    })?;

                let exists: bool = row.get(0);
                if !exists {
                    return Err(StoreError::NotReady(
                        "Table 'messages' does not exist. \
                         Please run the setup SQL from docs/db_setup/messages.sql"
                            .to_string(),
                    ));
                }

                info!("Message store table verified");
                Ok(())
            })
            .await?;

        Ok(())
    }

    fn row_to_message(row: &Row) -> StoredMessage {
        StoredMessage {
            id: row.get("id"),
            conversation_id: row.get("conversation_id"),
            direction: row.get("direction"),
            timestamp: row.get("timestamp"),
            text: row.get("text"),
            sender_name: row.get("sender_name"),
            tenant: row.get("tenant"),
        }
    }
}

#[async_trait]
impl MessageStore for PostgreSQLMessageStore {
    async fn list_all_messages(
        &self,
        tenant: Option<&str>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        self.ensure_ready().await?;

        // keyset pagination on the primary key; a short page ends the scan
        let mut messages = Vec::new();
        let mut last_id = String::new();
        let mut pages = 0;
        loop {
            let rows = self
                .client
                .query(LIST_PAGE_QUERY, &[&last_id, &tenant, &self.page_size])
                .await
                .map_err(|e| {
                    StoreError::Query(format!(
                        "Failed to list messages after id '{}': {}",
                        last_id, e
                    ))
                })?;
            pages += 1;

            let fetched = rows.len() as i64;
            messages.extend(rows.iter().map(Self::row_to_message));
            match messages.last() {
                Some(last) if fetched == self.page_size => last_id = last.id.clone(),
                _ => break,
            }
        }

        debug!(
            tenant = tenant.unwrap_or("*"),
            pages,
            count = messages.len(),
            "listed messages from postgres"
        );
        Ok(messages)
    }
}

/// PostgreSQL backed group directory (`conversation_groups` table)
#[derive(Clone)]
pub struct PostgreSQLGroupDirectory {
    client: Arc<Client>,
}

impl PostgreSQLGroupDirectory {
    pub async fn new(connection_string: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: connect(connection_string).await?,
        })
    }
}

#[async_trait]
impl GroupNameResolver for PostgreSQLGroupDirectory {
    async fn resolve_name(&self, conversation_id: &str) -> String {
        let result = self
            .client
            .query_opt(
                "SELECT group_name FROM conversation_groups WHERE conversation_id = $1",
                &[&conversation_id],
            )
            .await;

        match result {
            Ok(Some(row)) => row.try_get::<_, Option<String>>(0).ok().flatten().unwrap_or_default(),
            Ok(None) => String::new(),
            Err(e) => {
                warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "group name lookup failed"
                );
                String::new()
            }
        }
    }
}

/*
PostgreSQL schema is maintained in docs/db_setup/messages.sql
Run that SQL file against your database before using this storage backend.
*/
