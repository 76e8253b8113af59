use crate::attachments::StoredUpload;
use crate::error::Result;
use crate::models::{NewUser, Property, PropertyChanges, PropertyDraft, UpdateOutcome, User};
use crate::store::PropertyFilters;
use async_trait::async_trait;

/// Persistence contract for property listings.
///
/// Implementations own the translation between wire and storage shapes, and the lifecycle of
/// the attachment files a request brought with it.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Validates and inserts a property, returning its id. `uploads` are discarded if the
    /// property cannot be stored.
    async fn create(&self, draft: PropertyDraft, uploads: &[StoredUpload]) -> Result<i64>;

    /// Lists properties matching `filters`, in insertion order.
    async fn find_all(&self, filters: &PropertyFilters) -> Result<Vec<Property>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Property>>;

    /// Applies a partial change. Non-empty `uploads` replace the media list wholesale.
    async fn update(
        &self,
        id: i64,
        changes: PropertyChanges,
        uploads: &[StoredUpload],
    ) -> Result<UpdateOutcome>;

    /// Deletes the row and then its attachment files. Returns `false` when there was no such
    /// property. File removal failures are logged only.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Credential storage. Never sees plaintext passwords.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create(&self, user: NewUser) -> Result<i64>;
}
