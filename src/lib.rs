//! Notification synchronization for the online examination platform.
//!
//! A [`NotificationStore`] caches the signed-in user's received and sent
//! notifications, a [`NotificationPoller`] keeps it fresh while a session is
//! active, and [`HttpNotificationService`] talks to the platform API.
//!
//! ```ignore
//! let config = ClientConfig::from_env()?;
//! let session = Session::from_token(config.token.as_deref().unwrap_or_default())?;
//! let service = HttpNotificationService::new(&config, None)?;
//! let store = NotificationStore::new(Arc::new(service));
//! let mut poller = NotificationPoller::new(store.clone(), config.poll_interval);
//! poller.set_session(Some(session));
//! ```

pub mod auth;
pub mod config;
pub mod notification;

pub use auth::session::{Role, Session, SessionError};
pub use config::{ClientConfig, ConfigError};
pub use notification::cache::NotificationCache;
pub use notification::http::HttpNotificationService;
pub use notification::model::{
    DraftError, Notification, NotificationDraft, NotificationError, NotificationId,
    NotificationStatus, NotificationUpdate, Scope, ServiceResponse,
};
pub use notification::poller::NotificationPoller;
pub use notification::service::NotificationService;
pub use notification::store::{NotificationStore, RefreshOutcome};
