use std::sync::Arc;

use chrono::Utc;

use crate::{
    auth::{AccessGate, Action, Principal},
    errors::{AppError, AppResult},
    models::{
        domain::{GamificationState, LevelProgression},
        dto::response::LeaderboardEntry,
    },
    repositories::{GamificationRepository, UserRepository},
    services::notifier::{Notification, Notifier},
};

/// Points, levels and streaks per user.
///
/// All level changes go through [`GamificationState::add_points`], so a
/// single award can cross several thresholds and each crossing produces its
/// own `LevelUp` notification after the `PointsAwarded` one.
pub struct GamificationService {
    repository: Arc<dyn GamificationRepository>,
    users: Arc<dyn UserRepository>,
    gate: AccessGate,
    notifier: Notifier,
    progression: LevelProgression,
    streak_bonus: u64,
}

impl GamificationService {
    pub fn new(
        repository: Arc<dyn GamificationRepository>,
        users: Arc<dyn UserRepository>,
        gate: AccessGate,
        notifier: Notifier,
        progression: LevelProgression,
        streak_bonus: u64,
    ) -> Self {
        Self {
            repository,
            users,
            gate,
            notifier,
            progression,
            streak_bonus,
        }
    }

    /// Current state, or a fresh level-1 state for a user who never earned
    /// points.
    pub async fn state(&self, user_id: &str) -> AppResult<GamificationState> {
        Ok(self
            .repository
            .find(user_id)
            .await?
            .unwrap_or_else(|| GamificationState::new(user_id, &self.progression)))
    }

    pub async fn award_points(
        &self,
        user_id: &str,
        amount: i64,
        reason: &str,
    ) -> AppResult<GamificationState> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount(amount));
        }

        let mut state = self.state(user_id).await?;
        let levels = state.add_points(amount as u64, &self.progression);
        let state = self.repository.save(state).await?;

        log::info!(
            "awarded {} points to user {} for {} (total {})",
            amount,
            user_id,
            reason,
            state.points
        );

        self.notifier.publish(Notification::PointsAwarded {
            user_id: user_id.to_string(),
            amount: amount as u64,
            reason: reason.to_string(),
            total: state.points,
        });
        for level in levels {
            log::info!("user {} reached level {}", user_id, level);
            self.notifier.publish(Notification::LevelUp {
                user_id: user_id.to_string(),
                level,
            });
        }

        Ok(state)
    }

    /// Direct award from the admin console.
    pub async fn grant(
        &self,
        actor: &Principal,
        user_id: &str,
        amount: i64,
        reason: &str,
    ) -> AppResult<GamificationState> {
        self.gate.authorize(actor, Action::AwardPoints)?;

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User with id '{}' not found", user_id)));
        }

        self.award_points(user_id, amount, reason).await
    }

    /// Add a streak day, then pay the streak bonus through [`Self::award_points`].
    pub async fn extend_streak(&self, user_id: &str) -> AppResult<GamificationState> {
        let mut state = self.state(user_id).await?;
        let streak_days = state.extend_streak(Utc::now());
        self.repository.save(state).await?;

        self.notifier.publish(Notification::StreakExtended {
            user_id: user_id.to_string(),
            streak_days,
        });

        if self.streak_bonus == 0 {
            return self.state(user_id).await;
        }

        self.award_points(
            user_id,
            self.streak_bonus as i64,
            &format!("{}-day streak", streak_days),
        )
        .await
    }

    pub async fn leaderboard(&self, limit: usize) -> AppResult<Vec<LeaderboardEntry>> {
        let states = self.repository.top(limit.clamp(1, 100)).await?;

        let mut entries = Vec::with_capacity(states.len());
        for (index, state) in states.into_iter().enumerate() {
            let full_name = self
                .users
                .find_by_id(&state.user_id)
                .await?
                .map(|u| u.full_name);

            entries.push(LeaderboardEntry {
                rank: index + 1,
                user_id: state.user_id,
                full_name,
                points: state.points,
                level: state.level,
            });
        }

        Ok(entries)
    }
}
