use crate::models::{Event, Message, Reply};
use crate::services::command::Command;
use crate::services::messaging::MessagingClient;
use crate::services::metadata::{MetadataStore, NewFileRecord};
use crate::services::resolver::{
    ContentKind, ContentResolver, ResolveError, TEXT_CONTENT_TYPE, content_type_for,
    stored_extension,
};
use crate::services::session::SessionStore;
use crate::services::storage::StorageService;
use crate::utils::validation::validate_file_size;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const SEND_FILE_PROMPT: &str = "Send file:";
pub const UPLOAD_SUCCESS: &str = "Upload successful!";
pub const UPLOAD_FIRST: &str =
    "Please use 'upload [category] filename' first before sending a file.";
pub const USAGE: &str = "USAGE:\nupload,open,list,rename,delete";
pub const HELP: &str = "Use 'upload' to upload\nUse 'open' to open files";
pub const NOT_FOUND: &str = "Error: File not found.";
pub const NO_FILES: &str = "No files found.";
pub const UNSUPPORTED_TYPE: &str = "Unsupported file type.";
pub const EMPTY_FILE: &str = "(empty file)";
pub const RENAMED: &str = "File renamed successfully!";
pub const DELETED: &str = "File deleted successfully!";
pub const FILE_TOO_LARGE: &str = "Error: file is too large.";

pub const METADATA_FAILED: &str = "Error saving file metadata.";
pub const RETRIEVE_FAILED: &str = "Error retrieving file.";
pub const UPLOAD_FAILED: &str = "Error uploading file.";
pub const OPEN_FAILED: &str = "Error opening file.";
pub const READ_FAILED: &str = "Error reading file content.";
pub const LIST_FAILED: &str = "Error listing files.";
pub const RENAME_FAILED: &str = "Error renaming file.";
pub const DELETE_FAILED: &str = "Error deleting file.";

/// Drives the upload/download conversation for every chat user.
pub struct CommandDispatcher {
    metadata: Arc<dyn MetadataStore>,
    storage: Arc<dyn StorageService>,
    sessions: Arc<dyn SessionStore>,
    messaging: Arc<dyn MessagingClient>,
    resolver: ContentResolver,
    max_content_size: usize,
}

impl CommandDispatcher {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        storage: Arc<dyn StorageService>,
        sessions: Arc<dyn SessionStore>,
        messaging: Arc<dyn MessagingClient>,
        max_content_size: usize,
    ) -> Self {
        let resolver = ContentResolver::new(metadata.clone(), storage.clone());
        Self {
            metadata,
            storage,
            sessions,
            messaging,
            resolver,
            max_content_size,
        }
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    /// Handles one webhook event and sends the reply, if there is one.
    pub async fn handle_event(&self, event: &Event) {
        let Event::Message {
            reply_token,
            source,
            message,
        } = event
        else {
            tracing::debug!("Ignoring non-message event");
            return;
        };

        let Some(user_id) = source.session_key() else {
            warn!("Message event from a {} source without any id", source.kind);
            return;
        };

        let Some(reply) = self.dispatch(user_id, message).await else {
            return;
        };

        if let Err(e) = self.messaging.send_reply(reply_token, &reply).await {
            error!("Failed to reply to {}: {:?}", user_id, e);
        }
    }

    /// Computes the reply for one message. `None` means stay silent.
    pub async fn dispatch(&self, user_id: &str, message: &Message) -> Option<Reply> {
        match message {
            Message::Text { text, .. } => self.handle_text(user_id, text).await,
            Message::Image { id } => Some(self.handle_payload(user_id, id, None, None).await),
            Message::File {
                id,
                file_name,
                file_size,
            } => Some(
                self.handle_payload(user_id, id, Some(file_name.as_str()), *file_size)
                    .await,
            ),
            Message::Unsupported => Some(Reply::text(HELP)),
        }
    }

    async fn handle_text(&self, user_id: &str, text: &str) -> Option<Reply> {
        let command = match Command::parse(text)? {
            Ok(command) => command,
            Err(e) => return Some(Reply::text(e.to_string())),
        };

        let reply = match command {
            Command::Upload {
                category,
                file_name,
            } => self.begin_upload(user_id, category, file_name).await,
            Command::Open { file_name } => self.open(file_name).await,
            Command::List { category } => self.list(category).await,
            Command::Rename { old_name, new_name } => self.rename(old_name, new_name).await,
            Command::Delete { file_name } => self.delete(file_name).await,
            Command::Other => match self.sessions.peek(user_id).await {
                Some(pending) => {
                    self.store_payload(
                        user_id,
                        &pending,
                        text.as_bytes().to_vec(),
                        ".txt",
                        TEXT_CONTENT_TYPE,
                    )
                    .await
                }
                None => Reply::text(USAGE),
            },
        };
        Some(reply)
    }

    async fn begin_upload(&self, user_id: &str, category: &str, file_name: &str) -> Reply {
        let record = NewFileRecord {
            user_id: user_id.to_string(),
            file_name: file_name.to_string(),
            theme: category.to_string(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.metadata.insert(record).await {
            error!("Error inserting metadata for {}: {:?}", file_name, e);
            return Reply::text(METADATA_FAILED);
        }

        self.sessions.begin(user_id, file_name).await;
        info!("{} started upload of {} ({})", user_id, file_name, category);
        Reply::text(SEND_FILE_PROMPT)
    }

    async fn handle_payload(
        &self,
        user_id: &str,
        message_id: &str,
        declared_name: Option<&str>,
        declared_size: Option<u64>,
    ) -> Reply {
        let Some(pending) = self.sessions.peek(user_id).await else {
            return Reply::text(UPLOAD_FIRST);
        };

        if let Some(size) = declared_size {
            if validate_file_size(size as usize, self.max_content_size).is_err() {
                return Reply::text(FILE_TOO_LARGE);
            }
        }

        let data = match self.messaging.fetch_message_content(message_id).await {
            Ok(data) => data,
            Err(e) => {
                error!("Error getting content of message {}: {:?}", message_id, e);
                return Reply::text(RETRIEVE_FAILED);
            }
        };

        if let Err(e) = validate_file_size(data.len(), self.max_content_size) {
            warn!("Rejected payload from {}: {}", user_id, e);
            return Reply::text(FILE_TOO_LARGE);
        }

        let ext = stored_extension(&data, declared_name);
        let content_type = content_type_for(&data);
        self.store_payload(user_id, &pending, data, &ext, content_type)
            .await
    }

    /// Stores the bytes as `<pending><ext>`, records the URL and closes the session.
    async fn store_payload(
        &self,
        user_id: &str,
        pending: &str,
        data: Vec<u8>,
        ext: &str,
        content_type: &str,
    ) -> Reply {
        let key = format!("{}{}", pending, ext);
        info!("Uploading {} ({} bytes, {})", key, data.len(), content_type);

        if let Err(e) = self.storage.upload_file(&key, data, content_type).await {
            error!("Error uploading {} to storage: {:?}", key, e);
            return Reply::text(UPLOAD_FAILED);
        }

        let url = self.storage.public_url(&key);
        match self.metadata.update_content_url(pending, &url).await {
            Ok(true) => info!("Uploaded file URL: {}", url),
            Ok(false) => warn!("Stored {} but no metadata row named {} remains", url, pending),
            Err(e) => {
                error!("Error recording URL for {}: {:?}", pending, e);
                return Reply::text(METADATA_FAILED);
            }
        }

        if !self.sessions.consume_if(user_id, pending).await {
            info!("{} started a newer upload while {} was stored", user_id, pending);
        }
        Reply::text(UPLOAD_SUCCESS)
    }

    async fn open(&self, file_name: &str) -> Reply {
        let url = match self.resolver.resolve(file_name).await {
            Ok(url) => url,
            Err(ResolveError::NotFound(_)) => return Reply::text(NOT_FOUND),
            Err(e) => {
                error!("Error resolving {}: {:?}", file_name, e);
                return Reply::text(OPEN_FAILED);
            }
        };

        match ContentKind::from_url(&url) {
            ContentKind::Text => match self.resolver.fetch_text(&url).await {
                Ok(content) if content.is_empty() => Reply::text(EMPTY_FILE),
                Ok(content) => Reply::text(content),
                Err(e) => {
                    error!("Error fetching text from {}: {:?}", url, e);
                    Reply::text(READ_FAILED)
                }
            },
            ContentKind::Image => Reply::image(url),
            ContentKind::Unsupported => Reply::text(UNSUPPORTED_TYPE),
        }
    }

    async fn list(&self, category: Option<&str>) -> Reply {
        let (header, result) = match category {
            None => ("Categories:", self.metadata.list_distinct_categories().await),
            Some(category) => (
                "Files:",
                self.metadata.list_file_names_by_category(category).await,
            ),
        };

        match result {
            Ok(items) if items.is_empty() => Reply::text(NO_FILES),
            Ok(items) => Reply::text(format!("{}\n{}", header, items.join("\n"))),
            Err(e) => {
                error!("Database query error: {:?}", e);
                Reply::text(LIST_FAILED)
            }
        }
    }

    /// Renames the metadata row only. The stored object keeps its key; later
    /// lookups go through the URL recorded on the row.
    async fn rename(&self, old_name: &str, new_name: &str) -> Reply {
        match self.metadata.rename(old_name, new_name).await {
            Ok(true) => Reply::text(RENAMED),
            Ok(false) => Reply::text(NOT_FOUND),
            Err(e) => {
                error!("Rename error {} -> {}: {:?}", old_name, new_name, e);
                Reply::text(RENAME_FAILED)
            }
        }
    }

    /// Deletes the object, then the row. Nothing is rolled back if the second
    /// step fails.
    async fn delete(&self, file_name: &str) -> Reply {
        let object_deleted = match self.resolver.resolve(file_name).await {
            Ok(url) => match self.storage.key_from_url(&url) {
                Some(key) => {
                    if let Err(e) = self.storage.delete_file(&key).await {
                        error!("Failed to delete {} from storage: {:?}", key, e);
                        return Reply::text(DELETE_FAILED);
                    }
                    true
                }
                None => {
                    warn!("Cannot derive object key from {}", url);
                    false
                }
            },
            Err(e) => {
                warn!("No stored object for {}: {}", file_name, e);
                false
            }
        };

        match self.metadata.delete(file_name).await {
            Ok(row_deleted) if object_deleted || row_deleted => Reply::text(DELETED),
            Ok(_) => Reply::text(DELETE_FAILED),
            Err(e) => {
                error!("Failed to delete {} from database: {:?}", file_name, e);
                Reply::text(DELETE_FAILED)
            }
        }
    }
}
