//! Object store trait definition.

use birdie_types::error::StorageError;

/// Durable reference to an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub id: String,
    pub name: String,
    /// Link suitable for playback or display.
    pub link: String,
}

/// Metadata used to poll for server-rendered thumbnails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub id: String,
    pub thumbnail_link: Option<String>,
}

/// Binary object storage organized in folders (Google Drive in production).
pub trait ObjectStore: Send + Sync {
    /// Create a folder and return its reference.
    fn create_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> impl std::future::Future<Output = Result<StoredObject, StorageError>> + Send;

    /// Upload bytes as a new file under `parent_id`.
    fn upload(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<StoredObject, StorageError>> + Send;

    fn metadata(
        &self,
        object_id: &str,
    ) -> impl std::future::Future<Output = Result<ObjectMetadata, StorageError>> + Send;

    fn delete(
        &self,
        object_id: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Public link for a folder, shown to users after an upload.
    fn folder_link(&self, folder_id: &str) -> String;
}
