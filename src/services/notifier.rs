use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::domain::Achievement;

/// User-visible feedback published by the services. Delivery (toasts,
/// email, push) belongs to whoever subscribes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    PointsAwarded {
        user_id: String,
        amount: u64,
        reason: String,
        total: u64,
    },
    LevelUp {
        user_id: String,
        level: u32,
    },
    StreakExtended {
        user_id: String,
        streak_days: u32,
    },
    CertificateIssued {
        user_id: String,
        course_id: String,
        certificate_id: String,
    },
    AchievementUnlocked {
        user_id: String,
        achievement: Achievement,
        title: String,
    },
    AccessDenied {
        user_id: String,
        action: String,
    },
    UserAdded {
        user_id: String,
        email: String,
    },
    PasswordResetRequested {
        email: String,
        #[serde(skip_serializing)]
        token: String,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::PointsAwarded { .. } => "points_awarded",
            Notification::LevelUp { .. } => "level_up",
            Notification::StreakExtended { .. } => "streak_extended",
            Notification::CertificateIssued { .. } => "certificate_issued",
            Notification::AchievementUnlocked { .. } => "achievement_unlocked",
            Notification::AccessDenied { .. } => "access_denied",
            Notification::UserAdded { .. } => "user_added",
            Notification::PasswordResetRequested { .. } => "password_reset_requested",
        }
    }
}

/// Fire-and-forget broadcast of [`Notification`]s.
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn publish(&self, notification: Notification) {
        let kind = notification.kind();
        // An error only means nobody is listening right now.
        match self.sender.send(notification) {
            Ok(receivers) => log::debug!("published {} to {} subscriber(s)", kind, receivers),
            Err(_) => log::debug!("published {} with no subscribers", kind),
        }
    }
}
