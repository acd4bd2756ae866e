//! Reminder notifications.
//!
//! Layout:
//!   .okr/notifications.yaml  : every notification, read or unread
//!
//! This module only stores reminders; delivering them is someone else's job.

use crate::checkin::{self, CheckinDue};
use crate::config::Config;
use crate::cycle::{Cycle, CycleStatus};
use crate::error::{OkrError, Result};
use crate::io;
use crate::paths;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

pub fn load_notifications(root: &Path) -> Result<Vec<Notification>> {
    io::read_yaml_or_default(&paths::notifications_path(root))
}

fn save_notifications(root: &Path, items: &[Notification]) -> Result<()> {
    io::write_yaml(&paths::notifications_path(root), &items)
}

pub fn push(
    root: &Path,
    user: Option<&str>,
    cycle: Option<&str>,
    message: impl Into<String>,
) -> Result<Notification> {
    let mut items = load_notifications(root)?;
    let n = Notification {
        id: uuid::Uuid::new_v4().to_string(),
        user: user.map(str::to_string),
        cycle: cycle.map(str::to_string),
        message: message.into(),
        created_at: Utc::now(),
        read: false,
    };
    items.push(n.clone());
    save_notifications(root, &items)?;
    Ok(n)
}

/// Notifications visible to `user`: addressed to them or to everyone.
pub fn for_user<'a>(items: &'a [Notification], user: Option<&str>, unread_only: bool) -> Vec<&'a Notification> {
    items
        .iter()
        .filter(|n| n.user.is_none() || n.user.as_deref() == user)
        .filter(|n| !unread_only || !n.read)
        .collect()
}

pub fn mark_read(root: &Path, id: &str) -> Result<Notification> {
    let mut items = load_notifications(root)?;
    let n = items
        .iter_mut()
        .find(|n| n.id == id)
        .ok_or_else(|| OkrError::NotificationNotFound(id.to_string()))?;
    n.read = true;
    let n = n.clone();
    save_notifications(root, &items)?;
    Ok(n)
}

/// Store one reminder per active cycle whose check-in is due on `today`.
///
/// A cycle that already has an unread reminder with the same text is not
/// reminded twice.
pub fn remind(root: &Path, config: &Config, today: NaiveDate) -> Result<Vec<Notification>> {
    let mut created = Vec::new();
    for cycle in Cycle::list(root)? {
        if cycle.status(today) != CycleStatus::Active {
            continue;
        }
        let checkins = checkin::load_checkins(root, &cycle.slug)?;
        let due: CheckinDue = checkin::checkin_due(&cycle.checkin_dates, &checkins, today);
        let Some(message) =
            checkin::reminder_message(&cycle.name, &due, &config.checkins.reminder_template)
        else {
            continue;
        };
        let existing = load_notifications(root)?;
        let already = existing
            .iter()
            .any(|n| !n.read && n.cycle.as_deref() == Some(cycle.slug.as_str()) && n.message == message);
        if already {
            continue;
        }
        created.push(push(root, None, Some(&cycle.slug), message)?);
    }
    Ok(created)
}
