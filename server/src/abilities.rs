//! Ability state machine.
//!
//! Every (side, kind) pair owns one [`AbilitySlot`]. A slot moves through
//! `idle -> active -> cooldown -> idle`; instant kinds skip the active phase.
//! Phase changes are driven by engine timers, so a slot also remembers the
//! handles it needs to cancel.

use crate::game::{Game, Rejection, TimerEvent};
use crate::physics;
use crate::timers::{TimerId, Timers};
use log::{debug, info};
use rand::Rng;
use shared::{AbilityEffect, AbilityKind, Packet, Side, SideMap};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AbilitySlot {
    pub active: bool,
    pub cooldown: bool,
    /// Pending end of the active phase.
    pub end_timer: Option<TimerId>,
    /// Pending end of the cooldown.
    pub cooldown_timer: Option<TimerId>,
}

/// How an ability kind moves through its phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Active for a fixed time, then cooldown.
    TimedBuff,
    /// One-shot effect on opponents, straight to cooldown.
    Instant,
    /// Like a buff, but a second use ends it early.
    Toggle,
    /// Spawns extra balls, straight to cooldown.
    Spawn,
}

pub fn shape(kind: AbilityKind) -> Shape {
    match kind {
        AbilityKind::Force | AbilityKind::Grow | AbilityKind::Magnet | AbilityKind::ZigzagBall => {
            Shape::TimedBuff
        }
        AbilityKind::ShrinkOpponent
        | AbilityKind::GhostPaddle
        | AbilityKind::InvertControls
        | AbilityKind::Distract
        | AbilityKind::ExplosiveBall => Shape::Instant,
        AbilityKind::Stick | AbilityKind::Telekinesis | AbilityKind::Stop => Shape::Toggle,
        AbilityKind::DuplicateBall => Shape::Spawn,
    }
}

#[derive(Debug, Default)]
pub struct AbilityBook {
    slots: HashMap<(Side, AbilityKind), AbilitySlot>,
}

impl AbilityBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, side: Side, kind: AbilityKind) -> AbilitySlot {
        self.slots.get(&(side, kind)).copied().unwrap_or_default()
    }

    pub fn slot_mut(&mut self, side: Side, kind: AbilityKind) -> &mut AbilitySlot {
        self.slots.entry((side, kind)).or_default()
    }

    pub fn is_active(&self, side: Side, kind: AbilityKind) -> bool {
        self.slot(side, kind).active
    }

    pub fn is_on_cooldown(&self, side: Side, kind: AbilityKind) -> bool {
        self.slot(side, kind).cooldown
    }

    pub fn active_sides(&self, kind: AbilityKind) -> SideMap<bool> {
        SideMap::from_fn(|side| self.is_active(side, kind))
    }

    pub fn any_active(&self, kind: AbilityKind) -> bool {
        Side::ALL.into_iter().any(|side| self.is_active(side, kind))
    }

    /// Ends every cooldown at once. Active phases are left alone.
    pub fn clear_cooldowns(&mut self, timers: &mut Timers<TimerEvent>) {
        for slot in self.slots.values_mut() {
            if let Some(id) = slot.cooldown_timer.take() {
                timers.cancel(id);
            }
            slot.cooldown = false;
        }
    }

    /// Forgets every slot. The caller is expected to clear the timer queue.
    pub fn reset(&mut self) {
        self.slots.clear();
    }
}

impl Game {
    /// Fires the caller's chosen ability.
    pub fn use_ability(&mut self, client_id: u32) -> Result<(), Rejection> {
        let player = self.roster.get(client_id).ok_or(Rejection::UnknownClient)?;
        let side = player.side;
        let kind = player.ability.ok_or(Rejection::NoAbility)?;
        if self.arena.clock.game_over {
            return Err(Rejection::MatchOver);
        }

        let slot = self.abilities.slot(side, kind);
        let shape = shape(kind);
        if slot.active {
            if shape == Shape::Toggle {
                debug!("Side {:?} ended {:?} early", side, kind);
                self.end_active(side, kind);
                return Ok(());
            }
            return Err(Rejection::AlreadyActive);
        }
        if slot.cooldown {
            return Err(Rejection::OnCooldown);
        }
        if kind == AbilityKind::Stop && self.arena.clock.is_paused {
            return Err(Rejection::Paused);
        }

        info!("Side {:?} used {:?}", side, kind);
        match shape {
            Shape::TimedBuff | Shape::Toggle => self.activate(side, kind),
            Shape::Instant => {
                self.fire_instant(side, kind);
                self.enter_cooldown(side, kind);
            }
            Shape::Spawn => {
                self.spawn_duplicates(side);
                self.enter_cooldown(side, kind);
            }
        }
        Ok(())
    }

    fn activate(&mut self, side: Side, kind: AbilityKind) {
        let mut effect = AbilityEffect::started(side, kind);
        match kind {
            AbilityKind::Grow => {
                let paddle = &mut self.arena.paddles[side];
                paddle.size *= self.config.grow_factor;
                paddle.shift(side, 0.0);
                self.repin(side);
            }
            AbilityKind::Stop => {
                self.arena.clock.is_paused = true;
                self.arena.clock.stopper_side = Some(side);
            }
            AbilityKind::Telekinesis => {
                let color = self.roster.player_on(side).map(|p| p.color.clone());
                physics::telekinesis_wave(&mut self.arena, side, color.as_deref());
                effect.color = color;
            }
            // Force, magnet, zigzag and stick are read by physics from the slot.
            _ => {}
        }

        let at = self.now + self.config.timing(kind).active_ms;
        let end = self.timers.schedule(at, TimerEvent::EndActive { side, kind });
        let slot = self.abilities.slot_mut(side, kind);
        slot.active = true;
        slot.end_timer = Some(end);

        self.outbox.to_all(Packet::AbilityEffect(effect));
        if kind == AbilityKind::Grow {
            self.publish_state();
        }
    }

    /// Leaves the active phase, reverting whatever activation changed, and
    /// starts the cooldown. Called by the end timer or by a manual toggle.
    pub(crate) fn end_active(&mut self, side: Side, kind: AbilityKind) {
        let slot = self.abilities.slot_mut(side, kind);
        if !slot.active {
            return;
        }
        slot.active = false;
        if let Some(id) = slot.end_timer.take() {
            self.timers.cancel(id);
        }

        let mut effect = AbilityEffect::ended(side, kind);
        match kind {
            AbilityKind::Grow => {
                let paddle = &mut self.arena.paddles[side];
                paddle.size /= self.config.grow_factor;
                paddle.shift(side, 0.0);
                self.repin(side);
            }
            AbilityKind::Stick => self.release_stuck_balls(side),
            AbilityKind::Stop => {
                if self.arena.clock.stopper_side == Some(side) {
                    self.arena.clock.is_paused = false;
                    self.arena.clock.stopper_side = None;
                }
            }
            AbilityKind::Telekinesis => {
                effect.color = self.roster.player_on(side).map(|p| p.color.clone());
            }
            _ => {}
        }

        self.enter_cooldown(side, kind);
        self.outbox.to_all(Packet::AbilityEffect(effect));
        if kind == AbilityKind::Grow {
            self.publish_state();
        }
    }

    pub(crate) fn enter_cooldown(&mut self, side: Side, kind: AbilityKind) {
        let at = self.now + self.config.timing(kind).cooldown_ms;
        let id = self.timers.schedule(at, TimerEvent::ClearCooldown { side, kind });
        let slot = self.abilities.slot_mut(side, kind);
        if let Some(stale) = slot.cooldown_timer.replace(id) {
            self.timers.cancel(stale);
        }
        slot.cooldown = true;
    }

    pub(crate) fn clear_cooldown(&mut self, side: Side, kind: AbilityKind) {
        let slot = self.abilities.slot_mut(side, kind);
        slot.cooldown = false;
        slot.cooldown_timer = None;
    }

    fn fire_instant(&mut self, side: Side, kind: AbilityKind) {
        let opponents = self.roster.opponents_of(side);
        match kind {
            AbilityKind::ShrinkOpponent => {
                let Some((_, target)) = self.pick_random(&opponents) else {
                    debug!("No opponent to shrink for {:?}", side);
                    return;
                };
                let paddle = &mut self.arena.paddles[target];
                paddle.size *= self.config.shrink_factor;
                paddle.shift(target, 0.0);
                self.repin(target);

                let at = self.now + self.config.timing(kind).active_ms;
                self.timers.schedule(at, TimerEvent::RestorePaddle { side: target });
                self.outbox
                    .to_all(Packet::AbilityEffect(AbilityEffect::started(target, kind)));
                self.publish_state();
            }
            AbilityKind::GhostPaddle => {
                if let Some((client, target)) = self.pick_random(&opponents) {
                    self.outbox.to_client(
                        client,
                        Packet::AbilityEffect(AbilityEffect::started(target, kind)),
                    );
                }
            }
            AbilityKind::InvertControls => {
                if let Some((client, _)) = self.pick_random(&opponents) {
                    self.outbox.to_client(
                        client,
                        Packet::AbilityEffect(AbilityEffect::started(side, kind)),
                    );
                }
            }
            AbilityKind::Distract => {
                for (client, _) in opponents {
                    self.outbox.to_client(
                        client,
                        Packet::AbilityEffect(AbilityEffect::started(side, kind)),
                    );
                }
            }
            AbilityKind::ExplosiveBall => {
                if let Some(pushed) =
                    physics::explosive_push(&mut self.arena, side, self.config.explosive_push)
                {
                    debug!("Explosion pushed {:?}", pushed);
                    self.repin(pushed);
                }
                self.publish_state();
                self.outbox
                    .to_all(Packet::AbilityEffect(AbilityEffect::started(side, kind)));
            }
            _ => {}
        }
    }

    /// Undoes a shrink on `side`.
    pub(crate) fn restore_paddle(&mut self, side: Side) {
        let paddle = &mut self.arena.paddles[side];
        paddle.size /= self.config.shrink_factor;
        paddle.shift(side, 0.0);
        self.repin(side);
        self.outbox.to_all(Packet::AbilityEffect(AbilityEffect::ended(
            side,
            AbilityKind::ShrinkOpponent,
        )));
        self.publish_state();
    }

    fn spawn_duplicates(&mut self, side: Side) {
        let drawn = self.rng.gen_range(1..=self.config.max_duplicates_per_use.max(1));
        let room = self
            .config
            .max_duplicates
            .saturating_sub(self.arena.duplicates.len());
        let count = u8::try_from(room).map_or(drawn, |room| drawn.min(room));
        if count == 0 {
            debug!("Side {:?} duplicate skipped, arena is at the ball limit", side);
            return;
        }
        physics::spawn_duplicates(&mut self.arena, count, self.config.duplicate_default_speed);
        info!("Side {:?} spawned {} duplicate balls", side, count);

        let mut effect = AbilityEffect::started(side, AbilityKind::DuplicateBall);
        effect.multiplier = Some(count);
        self.outbox.to_all(Packet::AbilityEffect(effect));
        self.publish_state();
    }

    fn release_stuck_balls(&mut self, side: Side) {
        let speed = self.config.stick_release_speed;
        for ball in self.arena.balls_mut() {
            if ball.stuck_to == Some(side) {
                physics::release_ball(ball, side, speed, &mut self.rng);
            }
        }
    }

    fn pick_random(&mut self, opponents: &[(u32, Side)]) -> Option<(u32, Side)> {
        if opponents.is_empty() {
            return None;
        }
        Some(opponents[self.rng.gen_range(0..opponents.len())])
    }
}
