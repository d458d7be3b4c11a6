use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::notification::cache::NotificationCache;
use crate::notification::model::{
    Notification, NotificationDraft, NotificationError, NotificationId, NotificationStatus,
    NotificationUpdate, Scope, ServiceResponse,
};
use crate::notification::service::NotificationService;

/// What happened to the cache as a result of a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Server list replaced the cached one
    Applied,
    /// Fetch failed; the previous list was kept
    Failed,
    /// Response arrived after the session was cleared and was ignored
    Discarded,
}

/// Shared handle to the current session's notifications.
///
/// Cloning is cheap and every clone sees the same cache. All writes go
/// through this type.
#[derive(Clone)]
pub struct NotificationStore {
    service: Arc<dyn NotificationService>,
    cache: Arc<watch::Sender<NotificationCache>>,
}

impl NotificationStore {
    pub fn new(service: Arc<dyn NotificationService>) -> Self {
        let (cache, _) = watch::channel(NotificationCache::default());
        Self {
            service,
            cache: Arc::new(cache),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationCache> {
        self.cache.subscribe()
    }

    pub fn snapshot(&self) -> NotificationCache {
        self.cache.borrow().clone()
    }

    pub fn notifications(&self, scope: Scope) -> Vec<Notification> {
        self.cache.borrow().notifications(scope).to_vec()
    }

    pub fn unread_count(&self) -> usize {
        self.cache.borrow().unread_count()
    }

    pub fn is_loading(&self) -> bool {
        self.cache.borrow().is_loading()
    }

    pub fn recent(&self, scope: Scope, limit: usize) -> Vec<Notification> {
        self.cache
            .borrow()
            .recent(scope, limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Replace the cached list for `scope` with the server's.
    ///
    /// Errors are logged and swallowed; the previous list stays visible.
    pub async fn refresh(&self, scope: Scope) -> RefreshOutcome {
        let mut epoch = 0;
        self.cache.send_modify(|cache| epoch = cache.begin_refresh());

        match self.service.list(scope).await {
            Ok(notifications) => {
                let count = notifications.len();
                let applied = self.cache.send_if_modified(|cache| {
                    if !cache.finish_refresh(epoch) {
                        return false;
                    }
                    cache.replace(scope, notifications);
                    true
                });

                if applied {
                    debug!("Refreshed {} {} notifications", count, scope.as_str());
                    RefreshOutcome::Applied
                } else {
                    debug!("Discarding {} refresh from a cleared session", scope.as_str());
                    RefreshOutcome::Discarded
                }
            }
            Err(e) => {
                if self.cache.send_if_modified(|cache| cache.finish_refresh(epoch)) {
                    error!("Failed to refresh {} notifications: {}", scope.as_str(), e);
                    RefreshOutcome::Failed
                } else {
                    RefreshOutcome::Discarded
                }
            }
        }
    }

    /// Send a new notification. The sent list is refreshed only when the
    /// server accepts it.
    pub async fn create(
        &self,
        draft: NotificationDraft,
    ) -> Result<ServiceResponse, NotificationError> {
        let response = self.service.create(draft).await?;

        if response.success {
            info!("Notification created");
            self.refresh(Scope::Sent).await;
        } else {
            warn!(
                "Notification creation rejected: {}",
                response.message.as_deref().unwrap_or("no message")
            );
        }

        Ok(response)
    }

    pub async fn update(
        &self,
        id: NotificationId,
        update: NotificationUpdate,
    ) -> Result<ServiceResponse, NotificationError> {
        let response = self.service.update(id, update).await;
        self.refresh(Scope::Sent).await;
        response
    }

    pub async fn delete(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        let response = self.service.delete(id).await;
        self.refresh(Scope::Sent).await;
        response
    }

    /// Mark a received notification as read.
    ///
    /// The cache is patched before the request goes out and is not rolled
    /// back if the request fails; the next refresh reconciles.
    pub async fn mark_read(
        &self,
        id: NotificationId,
    ) -> Result<ServiceResponse, NotificationError> {
        if !self.cache.send_if_modified(|cache| cache.apply_read(id)) {
            debug!("Notification {} not cached as unread, nothing to patch", id);
        }

        let response = self.service.mark_read(id).await;
        match &response {
            Ok(r) if !r.success => warn!(
                "Server refused to mark notification {} as read: {}",
                id,
                r.message.as_deref().unwrap_or("no message")
            ),
            Err(e) => warn!("Failed to mark notification {} as read: {}", id, e),
            _ => {}
        }
        response
    }

    pub async fn publish(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        let epoch = self.cache.borrow().epoch();
        let response = self.service.publish(id).await?;
        if response.success {
            self.patch_status(epoch, id, NotificationStatus::Published);
        }
        Ok(response)
    }

    pub async fn unpublish(
        &self,
        id: NotificationId,
    ) -> Result<ServiceResponse, NotificationError> {
        let epoch = self.cache.borrow().epoch();
        let response = self.service.unpublish(id).await?;
        if response.success {
            self.patch_status(epoch, id, NotificationStatus::Draft);
        }
        Ok(response)
    }

    fn patch_status(&self, epoch: u64, id: NotificationId, status: NotificationStatus) {
        let patched = self
            .cache
            .send_if_modified(|cache| cache.epoch() == epoch && cache.set_status(id, status));
        if patched {
            info!("Notification {} is now {}", id, status.as_str());
        }
    }

    /// Swap the credential used for every request from now on.
    pub fn set_token(&self, token: Option<String>) {
        self.service.set_token(token);
    }

    /// Forget everything for the current identity.
    pub fn clear(&self) {
        self.cache.send_modify(NotificationCache::reset);
        info!("Notification cache cleared");
    }
}
