//! Match tuning. Every duration and physics factor the engine uses lives here
//! so a match can be reproduced from its config alone.

use shared::AbilityKind;
use std::collections::HashMap;

/// How long an ability stays active and how long its cooldown lasts, in ms.
///
/// Instant abilities have no active phase; for `ShrinkOpponent` the active
/// duration is the delay before the target's paddle is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityTiming {
    pub active_ms: u64,
    pub cooldown_ms: u64,
}

impl AbilityTiming {
    pub const fn new(active_ms: u64, cooldown_ms: u64) -> Self {
        Self {
            active_ms,
            cooldown_ms,
        }
    }
}

/// Built-in timing table.
pub fn default_timing(kind: AbilityKind) -> AbilityTiming {
    match kind {
        AbilityKind::Force => AbilityTiming::new(1_000, 5_000),
        AbilityKind::Grow => AbilityTiming::new(10_000, 5_000),
        AbilityKind::Magnet => AbilityTiming::new(3_000, 5_000),
        AbilityKind::ZigzagBall => AbilityTiming::new(3_000, 5_000),
        AbilityKind::ShrinkOpponent => AbilityTiming::new(4_000, 8_000),
        AbilityKind::GhostPaddle
        | AbilityKind::InvertControls
        | AbilityKind::Distract
        | AbilityKind::ExplosiveBall
        | AbilityKind::DuplicateBall => AbilityTiming::new(0, 8_000),
        AbilityKind::Stick => AbilityTiming::new(3_000, 10_000),
        AbilityKind::Telekinesis => AbilityTiming::new(2_000, 5_000),
        AbilityKind::Stop => AbilityTiming::new(2_000, 8_000),
    }
}

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub tick_rate: u32,
    pub match_duration_secs: u32,
    pub win_score: u32,

    // Paddles
    pub paddle_step: f32,
    pub paddle_step_fast: f32,
    pub grow_factor: f32,
    pub shrink_factor: f32,
    pub explosive_push: f32,

    // Balls
    pub launch_speed: f32,
    pub max_ball_speed: f32,
    pub acceleration: f32,
    pub force_factor: f32,
    pub stick_release_speed: f32,
    pub duplicate_default_speed: f32,
    pub max_duplicates_per_use: u8,
    /// Live duplicates allowed at once. Keeps a `State` snapshot well inside
    /// one 4096-byte datagram.
    pub max_duplicates: usize,
    /// Width of the uniform jitter added to each velocity component on a hit.
    pub hit_jitter: f32,
    pub duplicate_hit_jitter: f32,
    pub zigzag_jitter: f32,
    pub magnet_range: f32,
    pub magnet_pull: f32,
    pub freeze_ms: u64,

    pub abilities: HashMap<AbilityKind, AbilityTiming>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            match_duration_secs: 300,
            win_score: 10,
            paddle_step: 10.0,
            paddle_step_fast: 20.0,
            grow_factor: 2.5,
            shrink_factor: 0.5,
            explosive_push: 60.0,
            launch_speed: 4.0,
            max_ball_speed: 16.0,
            acceleration: 1.08,
            force_factor: 1.5,
            stick_release_speed: 4.0,
            duplicate_default_speed: 6.0,
            max_duplicates_per_use: 5,
            max_duplicates: 32,
            hit_jitter: 1.0,
            duplicate_hit_jitter: 0.5,
            zigzag_jitter: 4.0,
            magnet_range: 200.0,
            magnet_pull: 0.02,
            freeze_ms: 1_000,
            abilities: AbilityKind::ALL
                .into_iter()
                .map(|kind| (kind, default_timing(kind)))
                .collect(),
        }
    }
}

impl MatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timing(&self, kind: AbilityKind) -> AbilityTiming {
        self.abilities
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_timing(kind))
    }

    /// Milliseconds between physics ticks.
    pub fn tick_interval_ms(&self) -> u64 {
        1_000 / u64::from(self.tick_rate.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_ability_has_timing() {
        let config = MatchConfig::new();
        for kind in AbilityKind::ALL {
            assert!(config.abilities.contains_key(&kind), "missing {:?}", kind);
            let timing = config.timing(kind);
            assert!(timing.cooldown_ms >= 5_000 && timing.cooldown_ms <= 10_000);
            assert!(timing.active_ms <= 10_000);
        }
    }

    #[test]
    fn test_timing_override() {
        let mut config = MatchConfig::new();
        config
            .abilities
            .insert(AbilityKind::Grow, AbilityTiming::new(500, 700));
        assert_eq!(config.timing(AbilityKind::Grow), AbilityTiming::new(500, 700));

        config.abilities.remove(&AbilityKind::Grow);
        assert_eq!(
            config.timing(AbilityKind::Grow),
            default_timing(AbilityKind::Grow)
        );
    }

    #[test]
    fn test_tick_interval() {
        let mut config = MatchConfig::new();
        assert_eq!(config.tick_interval_ms(), 33);
        config.tick_rate = 60;
        assert_eq!(config.tick_interval_ms(), 16);
        config.tick_rate = 0;
        assert_eq!(config.tick_interval_ms(), 1_000);
    }
}
