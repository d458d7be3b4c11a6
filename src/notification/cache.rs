use crate::notification::model::{Notification, NotificationId, NotificationStatus, Scope};

/// Locally known notifications for the current session.
///
/// Only [`NotificationStore`](crate::notification::store::NotificationStore)
/// can mutate a cache; consumers get read access through snapshots and
/// `watch` subscriptions.
#[derive(Debug, Clone, Default)]
pub struct NotificationCache {
    received: Vec<Notification>,
    sent: Vec<Notification>,
    unread_count: usize,
    refreshes_in_flight: usize,
    epoch: u64,
}

impl NotificationCache {
    pub fn notifications(&self, scope: Scope) -> &[Notification] {
        match scope {
            Scope::Received => &self.received,
            Scope::Sent => &self.sent,
        }
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn is_loading(&self) -> bool {
        self.refreshes_in_flight > 0
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.received
            .iter()
            .chain(self.sent.iter())
            .find(|n| n.id == id)
    }

    /// Newest first by `created_at`, at most `limit` entries.
    pub fn recent(&self, scope: Scope, limit: usize) -> Vec<&Notification> {
        let mut entries: Vec<&Notification> = self.notifications(scope).iter().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        entries
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn begin_refresh(&mut self) -> u64 {
        self.refreshes_in_flight += 1;
        self.epoch
    }

    /// Returns false when the refresh belongs to a torn-down session.
    pub(crate) fn finish_refresh(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.refreshes_in_flight = self.refreshes_in_flight.saturating_sub(1);
        true
    }

    pub(crate) fn replace(&mut self, scope: Scope, notifications: Vec<Notification>) {
        match scope {
            Scope::Received => {
                self.unread_count = notifications.iter().filter(|n| !n.is_read).count();
                self.received = notifications;
            }
            Scope::Sent => self.sent = notifications,
        }
    }

    /// Optimistic read patch. Applies only to a cached, still-unread
    /// received entry and then lowers the count by exactly one.
    pub(crate) fn apply_read(&mut self, id: NotificationId) -> bool {
        let Some(entry) = self.received.iter_mut().find(|n| n.id == id && !n.is_read) else {
            return false;
        };
        entry.is_read = true;
        self.unread_count = self.unread_count.saturating_sub(1);
        true
    }

    pub(crate) fn set_status(&mut self, id: NotificationId, status: NotificationStatus) -> bool {
        let mut changed = false;
        for entry in self
            .received
            .iter_mut()
            .chain(self.sent.iter_mut())
            .filter(|n| n.id == id)
        {
            if entry.status != status {
                entry.status = status;
                changed = true;
            }
        }
        changed
    }

    /// Drop everything and invalidate responses still in flight.
    pub(crate) fn reset(&mut self) {
        self.received.clear();
        self.sent.clear();
        self.unread_count = 0;
        self.refreshes_in_flight = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }
}
