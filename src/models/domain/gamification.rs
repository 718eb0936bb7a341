//! Points, levels and streaks for a single learner.
//!
//! Levels follow one rule: a level-up happens whenever
//! `points >= points_at_level_start + points_to_next_level`. Each level-up
//! moves `points_at_level_start` forward by the span just completed and
//! asks the [`LevelProgression`] for the next span, so a single large award
//! can cross several levels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Points needed to clear each level: `base_points + step_points * (level - 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LevelProgression {
    base_points: u64,
    step_points: u64,
}

impl LevelProgression {
    pub fn new(base_points: u64, step_points: u64) -> AppResult<Self> {
        if base_points == 0 {
            return Err(AppError::ValidationError(
                "Level base points must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            base_points,
            step_points,
        })
    }

    /// Span of points from the start of `level` to the start of `level + 1`.
    pub fn points_for_level(&self, level: u32) -> u64 {
        let steps = u64::from(level.saturating_sub(1));
        self.base_points
            .saturating_add(self.step_points.saturating_mul(steps))
    }
}

impl Default for LevelProgression {
    fn default() -> Self {
        Self {
            base_points: 250,
            step_points: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GamificationState {
    pub user_id: String,
    pub points: u64,
    pub level: u32,
    pub points_at_level_start: u64,
    pub points_to_next_level: u64,
    pub streak_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_streak_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl GamificationState {
    pub fn new(user_id: &str, progression: &LevelProgression) -> Self {
        GamificationState {
            user_id: user_id.to_string(),
            points: 0,
            level: 1,
            points_at_level_start: 0,
            points_to_next_level: progression.points_for_level(1),
            streak_days: 0,
            last_streak_at: None,
            updated_at: Utc::now(),
        }
    }

    pub fn next_level_threshold(&self) -> u64 {
        self.points_at_level_start
            .saturating_add(self.points_to_next_level)
    }

    /// Points still missing before the next level-up.
    pub fn points_remaining(&self) -> u64 {
        self.next_level_threshold().saturating_sub(self.points)
    }

    /// Add points and apply every level-up they unlock. Returns the levels
    /// reached, in order; empty when no threshold was crossed.
    pub fn add_points(&mut self, amount: u64, progression: &LevelProgression) -> Vec<u32> {
        self.points = self.points.saturating_add(amount);
        self.updated_at = Utc::now();

        let mut reached = Vec::new();
        while self.points_to_next_level > 0 && self.points >= self.next_level_threshold() {
            self.points_at_level_start = self.next_level_threshold();
            self.level += 1;
            self.points_to_next_level = progression.points_for_level(self.level);
            reached.push(self.level);
        }
        reached
    }

    pub fn extend_streak(&mut self, now: DateTime<Utc>) -> u32 {
        self.streak_days = self.streak_days.saturating_add(1);
        self.last_streak_at = Some(now);
        self.updated_at = now;
        self.streak_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(points: u64) -> LevelProgression {
        LevelProgression::new(points, 0).unwrap()
    }

    #[test]
    fn test_new_state_starts_at_level_one() {
        let state = GamificationState::new("user-1", &LevelProgression::default());
        assert_eq!(state.level, 1);
        assert_eq!(state.points_to_next_level, 250);
        assert_eq!(state.points_remaining(), 250);
    }

    #[test]
    fn test_single_award_can_cross_two_levels() {
        let progression = flat(250);
        let mut state = GamificationState::new("user-1", &progression);

        let reached = state.add_points(600, &progression);

        assert_eq!(reached, vec![2, 3]);
        assert_eq!(state.level, 3);
        assert_eq!(state.points_at_level_start, 500);
        assert_eq!(state.points_remaining(), 150);
    }

    #[test]
    fn test_exact_threshold_levels_up() {
        let progression = flat(100);
        let mut state = GamificationState::new("user-1", &progression);

        assert!(state.add_points(99, &progression).is_empty());
        assert_eq!(state.add_points(1, &progression), vec![2]);
        assert_eq!(state.points_remaining(), 100);
    }

    #[test]
    fn test_increasing_progression() {
        let progression = LevelProgression::new(100, 50).unwrap();
        assert_eq!(progression.points_for_level(1), 100);
        assert_eq!(progression.points_for_level(3), 200);

        let mut state = GamificationState::new("user-1", &progression);
        // 100 clears level 1, 150 more clears level 2, 200 more is needed for level 4.
        let reached = state.add_points(300, &progression);
        assert_eq!(reached, vec![2, 3]);
        assert_eq!(state.points_at_level_start, 250);
        assert_eq!(state.points_to_next_level, 200);
    }

    #[test]
    fn test_zero_base_points_is_rejected() {
        assert!(LevelProgression::new(0, 10).is_err());
    }
}
