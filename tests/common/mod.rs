#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use line_file_bot::models::Reply;
use line_file_bot::services::dispatcher::CommandDispatcher;
use line_file_bot::services::messaging::MessagingClient;
use line_file_bot::services::metadata::{MetadataStore, NewFileRecord, SeaOrmMetadataStore};
use line_file_bot::services::session::InMemorySessionStore;
use line_file_bot::services::storage::StorageService;
use line_file_bot::infrastructure::database::run_migrations;
use sea_orm::{Database, DatabaseConnection};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const PUBLIC_BASE: &str = "https://pub-test.r2.dev";

pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52,
];

/// Bucket held in memory.
#[derive(Default)]
pub struct MockStorageService {
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MockStorageService {
    pub fn put(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), "application/octet-stream".to_string()));
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, content_type)| content_type.clone())
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_file(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn get_file(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| anyhow::anyhow!("NoSuchKey: {}", key))
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn file_exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }

    fn public_base_url(&self) -> &str {
        PUBLIC_BASE
    }
}

/// Records every reply instead of calling LINE.
#[derive(Default)]
pub struct MockMessagingClient {
    pub replies: Mutex<Vec<(String, Reply)>>,
    pub content: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockMessagingClient {
    pub fn with_content(&self, message_id: &str, data: &[u8]) {
        self.content
            .lock()
            .unwrap()
            .insert(message_id.to_string(), data.to_vec());
    }

    pub fn sent(&self) -> Vec<(String, Reply)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingClient for MockMessagingClient {
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), Reply::text(text)));
        Ok(())
    }

    async fn reply_image(&self, reply_token: &str, url: &str, preview_url: &str) -> Result<()> {
        self.replies.lock().unwrap().push((
            reply_token.to_string(),
            Reply::Image {
                original_url: url.to_string(),
                preview_url: preview_url.to_string(),
            },
        ));
        Ok(())
    }

    async fn fetch_message_content(&self, message_id: &str) -> Result<Vec<u8>> {
        self.content
            .lock()
            .unwrap()
            .get(message_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no content for message {}", message_id))
    }
}

/// Counts metadata deletes on top of the real store.
pub struct CountingMetadataStore {
    pub inner: SeaOrmMetadataStore,
    pub deletes: AtomicUsize,
}

impl CountingMetadataStore {
    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataStore for CountingMetadataStore {
    async fn insert(&self, record: NewFileRecord) -> Result<()> {
        self.inner.insert(record).await
    }

    async fn get_content_url(&self, file_name: &str) -> Result<Option<String>> {
        self.inner.get_content_url(file_name).await
    }

    async fn update_content_url(&self, file_name: &str, url: &str) -> Result<bool> {
        self.inner.update_content_url(file_name, url).await
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> Result<bool> {
        self.inner.rename(old_name, new_name).await
    }

    async fn delete(&self, file_name: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(file_name).await
    }

    async fn list_distinct_categories(&self) -> Result<Vec<String>> {
        self.inner.list_distinct_categories().await
    }

    async fn list_file_names_by_category(&self, category: &str) -> Result<Vec<String>> {
        self.inner.list_file_names_by_category(category).await
    }
}

pub struct TestBot {
    pub db: DatabaseConnection,
    pub dispatcher: Arc<CommandDispatcher>,
    pub metadata: Arc<CountingMetadataStore>,
    pub storage: Arc<MockStorageService>,
    pub sessions: Arc<InMemorySessionStore>,
    pub messaging: Arc<MockMessagingClient>,
}

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

pub async fn setup_bot(max_content_size: usize) -> TestBot {
    let db = setup_db().await;
    let metadata = Arc::new(CountingMetadataStore {
        inner: SeaOrmMetadataStore::new(db.clone()),
        deletes: AtomicUsize::new(0),
    });
    let storage = Arc::new(MockStorageService::default());
    let sessions = Arc::new(InMemorySessionStore::new());
    let messaging = Arc::new(MockMessagingClient::default());

    let dispatcher = Arc::new(CommandDispatcher::new(
        metadata.clone(),
        storage.clone(),
        sessions.clone(),
        messaging.clone(),
        max_content_size,
    ));

    TestBot {
        db,
        dispatcher,
        metadata,
        storage,
        sessions,
        messaging,
    }
}
