use std::sync::Arc;
use tracing::{info, warn};

use exam_notification_sync::config::TOKEN_VAR;
use exam_notification_sync::{
    ClientConfig, ConfigError, HttpNotificationService, NotificationPoller, NotificationStore,
    Scope, Session,
};

const HEADLINE_COUNT: usize = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env()?;
    let token = config
        .token
        .clone()
        .ok_or(ConfigError::Missing(TOKEN_VAR))?;
    let session = Session::from_token(&token)?;

    info!(
        "Watching notifications for user {} ({}) at {}",
        session.user_id,
        session.role.as_str(),
        config.base_url
    );

    // The poller installs the session token before its first request
    let service = HttpNotificationService::new(&config, None)?;
    let store = NotificationStore::new(Arc::new(service));
    let mut updates = store.subscribe();

    let mut poller = NotificationPoller::new(store.clone(), config.poll_interval);
    poller.set_session(Some(session));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last_unread = None;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Notification store closed");
                    break;
                }

                let (unread, loading, headlines) = {
                    let cache = updates.borrow_and_update();
                    let headlines: Vec<String> = cache
                        .recent(Scope::Received, HEADLINE_COUNT)
                        .into_iter()
                        .map(|n| n.title.clone())
                        .collect();
                    (cache.unread_count(), cache.is_loading(), headlines)
                };

                if loading || last_unread == Some(unread) {
                    continue;
                }
                info!("{} unread notification(s)", unread);
                for title in headlines {
                    info!("  - {}", title);
                }
                last_unread = Some(unread);
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    poller.set_session(None);
    Ok(())
}
