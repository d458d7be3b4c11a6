use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::auth::session::Session;
use crate::notification::model::Scope;
use crate::notification::store::NotificationStore;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

struct ActivePoll {
    session: Session,
    handle: JoinHandle<()>,
}

/// Keeps a [`NotificationStore`] in step with the server for the signed-in
/// user. At most one polling task runs at a time, none while signed out.
pub struct NotificationPoller {
    store: NotificationStore,
    period: Duration,
    active: Option<ActivePoll>,
}

impl NotificationPoller {
    pub fn new(store: NotificationStore, period: Duration) -> Self {
        Self {
            store,
            period,
            active: None,
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn is_polling(&self) -> bool {
        self.active
            .as_ref()
            .map(|active| !active.handle.is_finished())
            .unwrap_or(false)
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|active| &active.session)
    }

    /// React to login, logout or a user switch.
    ///
    /// The store's credential always follows the session: it is swapped
    /// before the new identity's first refresh and dropped on logout.
    /// Must be called from within a tokio runtime.
    pub fn set_session(&mut self, session: Option<Session>) {
        let Some(session) = session else {
            if self.active.is_some() {
                info!("Session ended, stopping notification polling");
            }
            self.stop();
            self.store.set_token(None);
            self.store.clear();
            return;
        };

        if let Some(active) = self.active.as_mut() {
            if active.session.same_identity(&session) && !active.handle.is_finished() {
                debug!("Session token rotated for user {}", session.user_id);
                self.store.set_token(Some(session.token.clone()));
                active.session = session;
                return;
            }
        }

        self.stop();
        self.store.clear();
        self.store.set_token(Some(session.token.clone()));

        info!(
            "Starting notification polling for user {} every {:?}",
            session.user_id, self.period
        );
        let handle = tokio::spawn(poll_loop(
            self.store.clone(),
            session.role.can_send_notifications(),
            self.period,
        ));
        self.active = Some(ActivePoll { session, handle });
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.abort();
        }
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(store: NotificationStore, include_sent: bool, period: Duration) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick completes immediately
        ticker.tick().await;

        // Not awaited here: a slow response must not hold back the next tick
        let store = store.clone();
        tokio::spawn(async move {
            if include_sent {
                futures::join!(store.refresh(Scope::Received), store.refresh(Scope::Sent));
            } else {
                store.refresh(Scope::Received).await;
            }
        });
    }
}
