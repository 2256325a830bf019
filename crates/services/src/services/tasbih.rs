//! Per-user dhikr counters kept in memory.
//!
//! Counters reset when the process restarts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_TARGET: u32 = 33;
pub const MAX_TARGET: u32 = 1000;
pub const MAX_STEP: u32 = 100;
pub const MAX_DHIKR_CHARS: usize = 100;
pub const DEFAULT_DHIKR: &str = "SubhanAllah";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TasbihError {
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasbihCounter {
    /// Progress within the current round, always below `target`.
    pub count: u32,
    pub target: u32,
    pub rounds: u64,
    pub total: u64,
    pub dhikr: String,
    pub updated_at: DateTime<Utc>,
}

impl Default for TasbihCounter {
    fn default() -> Self {
        Self {
            count: 0,
            target: DEFAULT_TARGET,
            rounds: 0,
            total: 0,
            dhikr: DEFAULT_DHIKR.to_string(),
            updated_at: Utc::now(),
        }
    }
}

impl TasbihCounter {
    fn advance(&mut self, step: u32) {
        let progress = self.count + step;
        self.rounds = self
            .rounds
            .saturating_add(u64::from(progress / self.target));
        self.count = progress % self.target;
        self.total = self.total.saturating_add(u64::from(step));
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TasbihSettings {
    pub target: Option<u32>,
    pub dhikr: Option<String>,
}

#[derive(Clone, Default)]
pub struct TasbihService {
    counters: Arc<DashMap<Uuid, TasbihCounter>>,
}

impl TasbihService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: Uuid) -> TasbihCounter {
        self.counters
            .get(&user_id)
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn increment(&self, user_id: Uuid, step: u32) -> Result<TasbihCounter, TasbihError> {
        if !(1..=MAX_STEP).contains(&step) {
            return Err(TasbihError::Invalid(format!(
                "step must be between 1 and {MAX_STEP}"
            )));
        }
        let mut counter = self.counters.entry(user_id).or_default();
        counter.advance(step);
        Ok(counter.clone())
    }

    /// Zero the progress but keep target and dhikr.
    pub fn reset(&self, user_id: Uuid) -> TasbihCounter {
        let mut counter = self.counters.entry(user_id).or_default();
        counter.count = 0;
        counter.rounds = 0;
        counter.total = 0;
        counter.updated_at = Utc::now();
        counter.clone()
    }

    pub fn configure(
        &self,
        user_id: Uuid,
        settings: &TasbihSettings,
    ) -> Result<TasbihCounter, TasbihError> {
        if let Some(target) = settings.target
            && !(1..=MAX_TARGET).contains(&target)
        {
            return Err(TasbihError::Invalid(format!(
                "target must be between 1 and {MAX_TARGET}"
            )));
        }
        let dhikr = settings.dhikr.as_deref().map(str::trim);
        if let Some(dhikr) = dhikr
            && (dhikr.is_empty() || dhikr.chars().count() > MAX_DHIKR_CHARS)
        {
            return Err(TasbihError::Invalid(format!(
                "dhikr must be between 1 and {MAX_DHIKR_CHARS} characters"
            )));
        }

        let mut counter = self.counters.entry(user_id).or_default();
        if let Some(target) = settings.target
            && target != counter.target
        {
            counter.target = target;
            counter.count = 0;
        }
        if let Some(dhikr) = dhikr {
            counter.dhikr = dhikr.to_string();
        }
        counter.updated_at = Utc::now();
        Ok(counter.clone())
    }

    pub fn active_counters(&self) -> usize {
        self.counters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_user_gets_default_counter() {
        let service = TasbihService::new();
        let counter = service.get(Uuid::new_v4());
        assert_eq!(counter.count, 0);
        assert_eq!(counter.target, DEFAULT_TARGET);
        assert_eq!(counter.dhikr, DEFAULT_DHIKR);
        assert_eq!(service.active_counters(), 0);
    }

    #[test]
    fn increment_rolls_over_into_rounds() {
        let service = TasbihService::new();
        let user = Uuid::new_v4();

        service.increment(user, 30).unwrap();
        let counter = service.increment(user, 40).unwrap();
        assert_eq!(counter.total, 70);
        assert_eq!(counter.rounds, 2);
        assert_eq!(counter.count, 4);

        assert!(matches!(service.increment(user, 0), Err(TasbihError::Invalid(_))));
        assert!(matches!(service.increment(user, 101), Err(TasbihError::Invalid(_))));
        assert_eq!(service.get(user).total, 70);
    }

    #[test]
    fn counters_saturate_instead_of_overflowing() {
        let mut counter = TasbihCounter {
            target: 1,
            rounds: u64::MAX - 1,
            total: u64::MAX - 1,
            ..Default::default()
        };
        counter.advance(MAX_STEP);
        assert_eq!(counter.rounds, u64::MAX);
        assert_eq!(counter.total, u64::MAX);
        assert_eq!(counter.count, 0);
    }

    #[test]
    fn reset_keeps_settings() {
        let service = TasbihService::new();
        let user = Uuid::new_v4();
        service
            .configure(
                user,
                &TasbihSettings {
                    target: Some(99),
                    dhikr: Some("Alhamdulillah".into()),
                },
            )
            .unwrap();
        service.increment(user, 10).unwrap();

        let counter = service.reset(user);
        assert_eq!((counter.count, counter.rounds, counter.total), (0, 0, 0));
        assert_eq!(counter.target, 99);
        assert_eq!(counter.dhikr, "Alhamdulillah");
    }

    #[test]
    fn changing_target_restarts_the_round() {
        let service = TasbihService::new();
        let user = Uuid::new_v4();
        service.increment(user, 10).unwrap();

        let same = service
            .configure(
                user,
                &TasbihSettings {
                    target: Some(DEFAULT_TARGET),
                    dhikr: None,
                },
            )
            .unwrap();
        assert_eq!(same.count, 10);

        let changed = service
            .configure(
                user,
                &TasbihSettings {
                    target: Some(100),
                    dhikr: None,
                },
            )
            .unwrap();
        assert_eq!(changed.count, 0);
        assert_eq!(changed.total, 10);
    }

    #[test]
    fn rejects_invalid_settings() {
        let service = TasbihService::new();
        let user = Uuid::new_v4();
        for settings in [
            TasbihSettings {
                target: Some(0),
                dhikr: None,
            },
            TasbihSettings {
                target: Some(1001),
                dhikr: None,
            },
            TasbihSettings {
                target: None,
                dhikr: Some("   ".into()),
            },
            TasbihSettings {
                target: None,
                dhikr: Some("x".repeat(101)),
            },
        ] {
            assert!(service.configure(user, &settings).is_err());
        }
        assert_eq!(service.get(user).target, DEFAULT_TARGET);
    }
}
