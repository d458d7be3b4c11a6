use async_trait::async_trait;

use crate::notification::model::{
    Notification, NotificationDraft, NotificationError, NotificationId, NotificationUpdate,
    Scope, ServiceResponse,
};

/// Remote notification API as seen by the store.
///
/// Implementations return `Ok` with `success == false` for business
/// rejections and reserve `Err` for transport and decoding failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Credential for every request issued from now on; `None` signs out.
    fn set_token(&self, token: Option<String>);

    async fn list(&self, scope: Scope) -> Result<Vec<Notification>, NotificationError>;

    async fn create(&self, draft: NotificationDraft) -> Result<ServiceResponse, NotificationError>;

    async fn update(
        &self,
        id: NotificationId,
        update: NotificationUpdate,
    ) -> Result<ServiceResponse, NotificationError>;

    async fn delete(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError>;

    async fn mark_read(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError>;

    async fn publish(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError>;

    async fn unpublish(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError>;
}
