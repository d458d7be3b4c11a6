//! In-memory notification service for unit tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::notification::model::{
    Notification, NotificationDraft, NotificationError, NotificationId, NotificationStatus,
    NotificationUpdate, Scope, ServiceResponse,
};
use crate::notification::service::NotificationService;

pub(crate) fn notification(id: i64, title: &str, is_read: bool) -> Notification {
    Notification {
        id: NotificationId(id),
        title: title.to_string(),
        message: format!("{} body", title),
        status: NotificationStatus::Published,
        is_read,
        image_data: None,
        recipient_user_ids: Vec::new(),
        recipient_group_ids: Vec::new(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + chrono::Duration::minutes(id),
        sender_name: Some("Ms. Rivera".to_string()),
    }
}

fn unavailable() -> NotificationError {
    NotificationError::ServerError {
        status: 503,
        message: "Service Unavailable".to_string(),
    }
}

#[derive(Default)]
struct FakeState {
    lists: HashMap<Scope, Vec<Notification>>,
    received_by_token: HashMap<String, Vec<Notification>>,
    token: Option<String>,
    last_list_token: Option<String>,
    scripted: VecDeque<(Duration, Vec<Notification>)>,
    list_calls: HashMap<Scope, usize>,
    fail_lists: bool,
    fail_mark_read: bool,
    mark_read_delay: Duration,
    next_id: i64,
}

/// Server stand-in with a mutable dataset and scriptable list responses.
#[derive(Default)]
pub(crate) struct FakeNotificationService {
    state: Mutex<FakeState>,
}

impl FakeNotificationService {
    pub fn with_received(received: Vec<Notification>) -> Self {
        let fake = Self::default();
        fake.set_list(Scope::Received, received);
        fake
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_list(&self, scope: Scope, notifications: Vec<Notification>) {
        self.state().lists.insert(scope, notifications);
    }

    /// Received list served only while `token` is the current credential.
    pub fn set_received_for(&self, token: &str, notifications: Vec<Notification>) {
        self.state()
            .received_by_token
            .insert(token.to_string(), notifications);
    }

    pub fn current_token(&self) -> Option<String> {
        self.state().token.clone()
    }

    pub fn last_list_token(&self) -> Option<String> {
        self.state().last_list_token.clone()
    }

    /// Next list call (any scope) sleeps `delay` and answers `notifications`.
    pub fn script_list(&self, delay: Duration, notifications: Vec<Notification>) {
        self.state().scripted.push_back((delay, notifications));
    }

    pub fn fail_lists(&self, fail: bool) {
        self.state().fail_lists = fail;
    }

    pub fn fail_mark_read(&self, fail: bool) {
        self.state().fail_mark_read = fail;
    }

    pub fn delay_mark_read(&self, delay: Duration) {
        self.state().mark_read_delay = delay;
    }

    pub fn list_calls(&self, scope: Scope) -> usize {
        self.state().list_calls.get(&scope).copied().unwrap_or(0)
    }

    pub fn server_copy(&self, scope: Scope, id: NotificationId) -> Option<Notification> {
        self.state()
            .lists
            .get(&scope)
            .and_then(|list| list.iter().find(|n| n.id == id).cloned())
    }

    fn set_status(&self, id: NotificationId, status: NotificationStatus) -> ServiceResponse {
        let mut state = self.state();
        let mut found = false;
        for list in state.lists.values_mut() {
            for entry in list.iter_mut().filter(|n| n.id == id) {
                entry.status = status;
                found = true;
            }
        }
        if found {
            ServiceResponse::ok()
        } else {
            ServiceResponse::rejected("Notification not found")
        }
    }
}

#[async_trait]
impl NotificationService for FakeNotificationService {
    fn set_token(&self, token: Option<String>) {
        self.state().token = token;
    }

    async fn list(&self, scope: Scope) -> Result<Vec<Notification>, NotificationError> {
        let scripted = {
            let mut state = self.state();
            *state.list_calls.entry(scope).or_insert(0) += 1;
            let token = state.token.clone();
            state.last_list_token = token;
            if state.fail_lists {
                return Err(unavailable());
            }
            let per_token = match (scope, &state.token) {
                (Scope::Received, Some(token)) => state.received_by_token.get(token).cloned(),
                _ => None,
            };
            match state.scripted.pop_front() {
                Some(script) => script,
                None => (
                    Duration::ZERO,
                    per_token
                        .or_else(|| state.lists.get(&scope).cloned())
                        .unwrap_or_default(),
                ),
            }
        };

        let (delay, notifications) = scripted;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(notifications)
    }

    async fn create(&self, draft: NotificationDraft) -> Result<ServiceResponse, NotificationError> {
        if draft.validate().is_err() {
            return Ok(ServiceResponse::rejected("Title, message and recipients are required"));
        }

        let mut state = self.state();
        state.next_id += 1;
        let mut created = notification(1000 + state.next_id, &draft.title, false);
        created.message = draft.message;
        created.status = NotificationStatus::Draft;
        created.recipient_user_ids = draft.user_ids;
        created.recipient_group_ids = draft.group_ids;
        created.image_data = draft.image_data;
        state
            .lists
            .entry(Scope::Sent)
            .or_default()
            .push(created.clone());

        Ok(ServiceResponse {
            success: true,
            message: None,
            notification: Some(created),
        })
    }

    async fn update(
        &self,
        id: NotificationId,
        update: NotificationUpdate,
    ) -> Result<ServiceResponse, NotificationError> {
        let mut state = self.state();
        let Some(entry) = state
            .lists
            .get_mut(&Scope::Sent)
            .and_then(|list| list.iter_mut().find(|n| n.id == id))
        else {
            return Ok(ServiceResponse::rejected("Notification not found"));
        };
        entry.title = update.title;
        entry.message = update.message;
        entry.status = update.status;
        Ok(ServiceResponse::ok())
    }

    async fn delete(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        let mut state = self.state();
        let list = state.lists.entry(Scope::Sent).or_default();
        let before = list.len();
        list.retain(|n| n.id != id);
        if list.len() == before {
            Ok(ServiceResponse::rejected("Notification not found"))
        } else {
            Ok(ServiceResponse::ok())
        }
    }

    async fn mark_read(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        let delay = self.state().mark_read_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.fail_mark_read {
            return Err(unavailable());
        }
        if let Some(entry) = state
            .lists
            .get_mut(&Scope::Received)
            .and_then(|list| list.iter_mut().find(|n| n.id == id))
        {
            entry.is_read = true;
        }
        Ok(ServiceResponse::ok())
    }

    async fn publish(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        Ok(self.set_status(id, NotificationStatus::Published))
    }

    async fn unpublish(&self, id: NotificationId) -> Result<ServiceResponse, NotificationError> {
        Ok(self.set_status(id, NotificationStatus::Draft))
    }
}
