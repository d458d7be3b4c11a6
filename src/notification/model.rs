use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Canonical notification identifier.
///
/// The API exposes both `id` and `notification_id` on notification rows.
/// Only this type travels past the HTTP boundary; see [`WireNotification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub i64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NotificationId {
    fn from(id: i64) -> Self {
        NotificationId(id)
    }
}

/// Which side of the conversation a list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Received,
    Sent,
}

impl Scope {
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Received => "received",
            Scope::Sent => "sent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Draft,
    #[default]
    Published,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationStatus::Draft => "draft",
            NotificationStatus::Published => "published",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub status: NotificationStatus,
    pub is_read: bool,
    pub image_data: Option<String>,
    pub recipient_user_ids: Vec<i64>,
    pub recipient_group_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub sender_name: Option<String>,
}

/// Notification row as the API returns it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireNotification {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub notification_id: Option<i64>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub status: NotificationStatus,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default, alias = "userIds")]
    pub recipient_user_ids: Vec<i64>,
    #[serde(default, alias = "groupIds")]
    pub recipient_group_ids: Vec<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

impl WireNotification {
    /// `notification_id` wins over `id`: on received rows `id` names the
    /// per-recipient delivery, not the notification itself.
    pub fn canonical_id(&self) -> Option<NotificationId> {
        self.notification_id.or(self.id).map(NotificationId)
    }

    pub fn into_notification(self) -> Option<Notification> {
        let Some(id) = self.canonical_id() else {
            warn!("Dropping notification without an identifier: {:?}", self.title);
            return None;
        };
        let Some(created_at) = self.created_at.as_deref().and_then(parse_timestamp) else {
            warn!(
                "Dropping notification {} with unreadable created_at: {:?}",
                id, self.created_at
            );
            return None;
        };

        Some(Notification {
            id,
            title: self.title,
            message: self.message,
            status: self.status,
            is_read: self.is_read,
            image_data: self.image_data,
            recipient_user_ids: self.recipient_user_ids,
            recipient_group_ids: self.recipient_group_ids,
            created_at,
            sender_name: self.sender_name,
        })
    }
}

/// RFC 3339, or a bare `YYYY-MM-DD[T ]HH:MM:SS[.f]` read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// List endpoints answer with either a bare array or a wrapped object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireList {
    Bare(Vec<WireNotification>),
    Wrapped { notifications: Vec<WireNotification> },
}

impl WireList {
    pub fn into_notifications(self) -> Vec<Notification> {
        let rows = match self {
            WireList::Bare(rows) => rows,
            WireList::Wrapped { notifications } => notifications,
        };
        rows.into_iter()
            .filter_map(WireNotification::into_notification)
            .collect()
    }
}

/// Request body for creating a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    #[serde(rename = "userIds")]
    pub user_ids: Vec<i64>,
    #[serde(rename = "groupIds")]
    pub group_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_data: Option<String>,
}

impl NotificationDraft {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            user_ids: Vec::new(),
            group_ids: Vec::new(),
            image_data: None,
        }
    }

    pub fn to_users(mut self, user_ids: impl IntoIterator<Item = i64>) -> Self {
        self.user_ids.extend(user_ids);
        self
    }

    pub fn to_groups(mut self, group_ids: impl IntoIterator<Item = i64>) -> Self {
        self.group_ids.extend(group_ids);
        self
    }

    pub fn with_image(mut self, image_data: impl Into<String>) -> Self {
        self.image_data = Some(image_data.into());
        self
    }

    /// Form-level checks for callers composing a draft. The store never runs
    /// these; the server has the final say.
    pub fn validate(&self) -> Result<(), DraftError> {
        validate_fields(&self.title, &self.message, &self.user_ids, &self.group_ids)
    }
}

/// Request body for editing a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationUpdate {
    pub title: String,
    pub message: String,
    #[serde(rename = "userIds")]
    pub user_ids: Vec<i64>,
    #[serde(rename = "groupIds")]
    pub group_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_data: Option<String>,
    pub status: NotificationStatus,
}

impl NotificationUpdate {
    pub fn from_draft(draft: NotificationDraft, status: NotificationStatus) -> Self {
        Self {
            title: draft.title,
            message: draft.message,
            user_ids: draft.user_ids,
            group_ids: draft.group_ids,
            image_data: draft.image_data,
            status,
        }
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        validate_fields(&self.title, &self.message, &self.user_ids, &self.group_ids)
    }
}

fn validate_fields(
    title: &str,
    message: &str,
    user_ids: &[i64],
    group_ids: &[i64],
) -> Result<(), DraftError> {
    if title.trim().is_empty() {
        return Err(DraftError::MissingTitle);
    }
    if message.trim().is_empty() {
        return Err(DraftError::MissingMessage);
    }
    if user_ids.is_empty() && group_ids.is_empty() {
        return Err(DraftError::NoRecipients);
    }
    Ok(())
}

/// Outcome of a write call as the server reported it.
///
/// `success == false` is a business rejection, not a transport failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceResponse {
    pub success: bool,
    pub message: Option<String>,
    pub notification: Option<Notification>,
}

impl ServiceResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            notification: None,
        }
    }
}

/// Write endpoint body. `success` is only trusted when present; otherwise the
/// HTTP status decides. Servers report failures under `message`, `error` or
/// both.
#[derive(Debug, Deserialize)]
pub(crate) struct WireResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub notification: Option<WireNotification>,
}

impl WireResponse {
    pub fn into_response(self, status_ok: bool) -> ServiceResponse {
        ServiceResponse {
            success: status_ok && self.success.unwrap_or(true),
            message: self.message.or(self.error),
            notification: self
                .notification
                .and_then(WireNotification::into_notification),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Message is required")]
    MissingMessage,

    #[error("At least one user or group must be selected")]
    NoRecipients,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Decode error: {0}")]
    DecodeError(String),
}
