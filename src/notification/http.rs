use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::notification::model::{
    Notification, NotificationDraft, NotificationError, NotificationId, NotificationUpdate,
    Scope, ServiceResponse, WireList, WireResponse,
};
use crate::notification::service::NotificationService;

/// `NotificationService` backed by the platform's HTTP+JSON API.
///
/// Clones share the bearer token, so a token swapped through one clone is
/// used by every request issued afterwards.
#[derive(Debug, Clone)]
pub struct HttpNotificationService {
    http: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpNotificationService {
    pub fn new(config: &ClientConfig, token: Option<String>) -> Result<Self, NotificationError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(token)),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn notifications_url(&self) -> String {
        format!("{}/notifications", self.base_url)
    }

    fn notification_url(&self, id: NotificationId, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("{}/notifications/{}/{}", self.base_url, id, action),
            None => format!("{}/notifications/{}", self.base_url, id),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // Send a write request and fold the body into a ServiceResponse
    async fn write(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<ServiceResponse, NotificationError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            error!("Notification {} request failed: {}", operation, e);
            NotificationError::HttpError(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() && body.trim().is_empty() {
            return Ok(ServiceResponse::ok());
        }

        match serde_json::from_str::<WireResponse>(&body) {
            Ok(wire) => {
                let result = wire.into_response(status.is_success());
                if !result.success {
                    info!(
                        "Notification {} rejected ({}): {}",
                        operation,
                        status.as_u16(),
                        result.message.as_deref().unwrap_or("no message")
                    );
                }
                Ok(result)
            }
            Err(e) if status.is_success() => {
                error!("Failed to decode notification {} response: {}", operation, e);
                Err(NotificationError::DecodeError(e.to_string()))
            }
            Err(_) => {
                error!("Notification {} failed with status {}", operation, status);
                Err(NotificationError::ServerError {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    async fn list(&self, scope: Scope) -> Result<Vec<Notification>, NotificationError> {
        debug!("Fetching {} notifications", scope.as_str());

        let response = self
            .authorize(self.http.get(self.notifications_url()))
            .query(&[("type", scope.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotificationError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let list: WireList = serde_json::from_str(&body)
            .map_err(|e| NotificationError::DecodeError(e.to_string()))?;
        Ok(list.into_notifications())
    }

    async fn create(&self, draft: NotificationDraft) -> Result<ServiceResponse, NotificationError> {
        info!("Creating notification {:?}", draft.title);
        self.write("create", self.http.post(self.notifications_url()).json(&draft))
            .await
    }

    async fn update(
        &self,
        id: NotificationId,
        update: NotificationUpdate,
    ) -> Result<ServiceResponse, NotificationError> {
        info!("Updating notification {}", id);
        self.write(
            "update",
            self.http.put(self.notification_url(id, None)).json(&update),
        )
        .await
    }

    async fn delete(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        info!("Deleting notification {}", id);
        self.write("delete", self.http.delete(self.notification_url(id, None)))
            .await
    }

    async fn mark_read(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        debug!("Marking notification {} as read", id);
        self.write(
            "mark-read",
            self.http.put(self.notification_url(id, Some("read"))),
        )
        .await
    }

    async fn publish(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        info!("Publishing notification {}", id);
        self.write(
            "publish",
            self.http.put(self.notification_url(id, Some("publish"))),
        )
        .await
    }

    async fn unpublish(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        info!("Unpublishing notification {}", id);
        self.write(
            "unpublish",
            self.http.put(self.notification_url(id, Some("unpublish"))),
        )
        .await
    }
}
