use crate::abilities::AbilityBook;
use crate::arena::{Arena, Ball};
use crate::config::MatchConfig;
use crate::physics::{self, PhysicsContext};
use crate::publisher::{snapshot, Outbound, Outbox};
use crate::roster::{ClientId, Profile, Roster};
use crate::timers::{TimerId, Timers};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{AbilityKind, Direction, Packet, Side, Winner, UNKNOWN_PLAYER};

/// Why a request left the match untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("room is full")]
    RoomFull,
    #[error("client has not joined")]
    UnknownClient,
    #[error("no ability selected")]
    NoAbility,
    #[error("match is over")]
    MatchOver,
    #[error("match is paused")]
    Paused,
    #[error("ability already active")]
    AlreadyActive,
    #[error("ability on cooldown")]
    OnCooldown,
}

/// Deferred work on the engine clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    EndActive { side: Side, kind: AbilityKind },
    ClearCooldown { side: Side, kind: AbilityKind },
    RestorePaddle { side: Side },
    LaunchBall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Assigned(Side),
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Lobby,
    Active,
    Over,
}

/// One match. Owns all mutable state; every method runs to completion
/// without blocking and queues its notifications in the outbox.
#[derive(Debug)]
pub struct Game {
    pub(crate) config: MatchConfig,
    pub(crate) arena: Arena,
    pub(crate) roster: Roster,
    pub(crate) abilities: AbilityBook,
    pub(crate) timers: Timers<TimerEvent>,
    pub(crate) rng: StdRng,
    pub(crate) outbox: Outbox,
    pub(crate) now: u64,
    loop_started: bool,
    ball_release: Option<TimerId>,
    tick: u64,
}

impl Game {
    pub fn new(config: MatchConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible match: same seed and same inputs give the same game.
    pub fn with_seed(config: MatchConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: MatchConfig, rng: StdRng) -> Self {
        let arena = Arena::new(config.match_duration_secs, config.launch_speed);
        Self {
            config,
            arena,
            roster: Roster::new(),
            abilities: AbilityBook::new(),
            timers: Timers::new(),
            rng,
            outbox: Outbox::new(),
            now: 0,
            loop_started: false,
            ball_release: None,
            tick: 0,
        }
    }

    /// Tells a new client which side it would get. Does not create a player.
    pub fn connect(&mut self, client_id: ClientId) -> ConnectOutcome {
        let side = match self.roster.side_of(client_id) {
            Some(side) => Some(side),
            None => self.roster.free_side(),
        };

        match side {
            Some(side) => {
                self.outbox.to_client(client_id, Packet::AssignedSide { side });
                self.outbox.to_client(client_id, Packet::ResetToJoin);
                ConnectOutcome::Assigned(side)
            }
            None => {
                info!("Client {} rejected: room full", client_id);
                self.outbox.to_client(
                    client_id,
                    Packet::Full {
                        reason: "Room full".to_string(),
                    },
                );
                ConnectOutcome::Full
            }
        }
    }

    pub fn join(&mut self, client_id: ClientId, profile: Profile) -> Result<Side, Rejection> {
        let side = self
            .roster
            .join(client_id, profile)
            .ok_or(Rejection::RoomFull)?;

        if self.roster.len() >= 2 {
            self.outbox.to_all(Packet::PlayersReady);
            self.start_loop();
        }
        Ok(side)
    }

    fn start_loop(&mut self) {
        if self.loop_started {
            return;
        }
        self.loop_started = true;
        info!("Match loop started with {} players", self.roster.len());
    }

    pub fn move_paddle(
        &mut self,
        client_id: ClientId,
        direction: Direction,
        fast: bool,
    ) -> Result<(), Rejection> {
        if self.arena.clock.game_over {
            return Err(Rejection::MatchOver);
        }
        let side = self
            .roster
            .side_of(client_id)
            .ok_or(Rejection::UnknownClient)?;
        let clock = &self.arena.clock;
        if clock.is_paused && clock.stopper_side != Some(side) {
            return Err(Rejection::Paused);
        }
        if !side.accepts(direction) {
            return Ok(());
        }

        let step = if fast {
            self.config.paddle_step_fast
        } else {
            self.config.paddle_step
        };
        self.arena.paddles[side].shift(side, direction.sign() * step);
        self.repin(side);
        Ok(())
    }

    /// Keeps balls glued to `side` on its paddle centre after it moved or resized.
    pub(crate) fn repin(&mut self, side: Side) {
        let paddle = self.arena.paddles[side];
        for ball in self.arena.balls_mut() {
            if ball.stuck_to == Some(side) {
                ball.pin_to(side, &paddle);
            }
        }
    }

    /// Removes the client's player. Its paddle stays behind as a wall.
    pub fn disconnect(&mut self, client_id: ClientId) -> Option<Side> {
        let player = self.roster.remove(client_id)?;
        self.outbox.to_all(Packet::PlayerLeft { side: player.side });
        self.publish_state();
        Some(player.side)
    }

    /// Back to the lobby: stops the loop, drops every pending timer and
    /// restores the default arena. Players keep their sides.
    pub fn reset_game(&mut self) {
        self.loop_started = false;
        self.timers.clear();
        self.abilities.reset();
        self.ball_release = None;

        self.roster.clear_profiles();
        for client_id in self.roster.client_ids() {
            self.outbox.to_client(client_id, Packet::ResetToJoin);
        }

        self.arena = Arena::new(self.config.match_duration_secs, self.config.launch_speed);
        self.reset_ball();
        info!("Match reset");
        self.outbox.to_all(Packet::GameReset {
            remaining_time: self.arena.clock.remaining_time,
        });
    }

    /// Moves the engine clock forward, firing every timer due on the way in
    /// deadline order.
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some((at, _, event)) = self.timers.pop_due(now_ms) {
            self.now = self.now.max(at);
            self.fire(event);
        }
        self.now = self.now.max(now_ms);
    }

    fn fire(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::EndActive { side, kind } => self.end_active(side, kind),
            TimerEvent::ClearCooldown { side, kind } => self.clear_cooldown(side, kind),
            TimerEvent::RestorePaddle { side } => self.restore_paddle(side),
            TimerEvent::LaunchBall => self.launch_ball(),
        }
    }

    /// One physics step followed by a state broadcast.
    pub fn tick(&mut self) {
        if !self.loop_started || self.arena.clock.game_over {
            return;
        }
        self.tick += 1;

        let ctx = self.physics_context();
        if let Some(side) = physics::step(&mut self.arena, &ctx, &self.config, &mut self.rng) {
            self.score_goal(side);
        }
        self.check_game_over();
        self.publish_state();
    }

    /// One second of match time, unless paused.
    pub fn countdown(&mut self) {
        if !self.loop_started {
            return;
        }
        let clock = &mut self.arena.clock;
        if clock.remaining_time > 0 && !clock.is_paused {
            clock.remaining_time -= 1;
        }
    }

    fn physics_context(&self) -> PhysicsContext {
        let clock = &self.arena.clock;
        PhysicsContext {
            occupied: self.roster.occupancy(),
            colors: self.roster.colors(),
            stick: self.abilities.active_sides(AbilityKind::Stick),
            magnet: self.abilities.active_sides(AbilityKind::Magnet),
            force: self.abilities.active_sides(AbilityKind::Force),
            zigzag: self.abilities.any_active(AbilityKind::ZigzagBall),
            frozen: clock.is_paused || clock.ball_frozen_until.is_some(),
        }
    }

    fn score_goal(&mut self, side: Side) {
        self.arena.scores[side] += 1;
        info!(
            "Goal for {:?}, score now {:?}",
            side, self.arena.scores.0
        );

        if let Some(player) = self.roster.player_on(side) {
            let packet = Packet::PointEffect {
                side,
                color: player.color.clone(),
                background: player.background.clone(),
            };
            self.outbox.to_all(packet);
        }

        self.abilities.clear_cooldowns(&mut self.timers);
        self.outbox.to_all(Packet::BallReset);
        self.reset_ball();
        self.arena.duplicates.clear();
    }

    /// Centres a fresh ball and holds it still for the freeze window.
    fn reset_ball(&mut self) {
        if let Some(id) = self.ball_release.take() {
            self.timers.cancel(id);
        }
        self.arena.ball = Ball::centered();
        let until = self.now + self.config.freeze_ms;
        self.arena.clock.ball_frozen_until = Some(until);
        self.ball_release = Some(self.timers.schedule(until, TimerEvent::LaunchBall));
    }

    fn launch_ball(&mut self) {
        self.ball_release = None;
        self.arena.clock.ball_frozen_until = None;

        let speed = self.config.launch_speed;
        let dx = if self.rng.gen_bool(0.5) { speed } else { -speed };
        let dy = if self.rng.gen_bool(0.5) { speed } else { -speed };
        self.arena.ball.dx = dx;
        self.arena.ball.dy = dy;
        debug!("Ball launched with ({}, {})", dx, dy);
    }

    fn check_game_over(&mut self) {
        if self.arena.clock.game_over {
            return;
        }
        let win_score = self.config.win_score;
        let reached = self.arena.scores.0.iter().any(|score| *score >= win_score);
        if self.arena.clock.remaining_time > 0 && !reached {
            return;
        }

        self.arena.clock.game_over = true;
        let side = self.arena.leader();
        let winner = Winner {
            side,
            name: self
                .roster
                .known_name(side)
                .unwrap_or_else(|| UNKNOWN_PLAYER.to_string()),
        };
        info!(
            "Game over: {:?} ({}) wins, final score {:?}",
            winner.side, winner.name, self.arena.scores.0
        );

        self.outbox.to_all(Packet::GameOver {
            winner: winner.clone(),
            score: self.arena.scores,
        });
        for (client_id, _) in self.roster.opponents_of(side) {
            self.outbox.to_client(
                client_id,
                Packet::Defeat {
                    winner: winner.clone(),
                },
            );
        }
    }

    pub(crate) fn publish_state(&mut self) {
        let state = snapshot(&self.arena, &self.roster);
        self.outbox.to_all(Packet::State(state));
    }

    /// Whether the physics and countdown schedules should be running.
    pub fn is_running(&self) -> bool {
        self.loop_started
    }

    pub fn phase(&self) -> MatchPhase {
        if !self.loop_started {
            MatchPhase::Lobby
        } else if self.arena.clock.game_over {
            MatchPhase::Over
        } else {
            MatchPhase::Active
        }
    }

    pub fn next_timer_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        self.outbox.drain()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Direct access for setting up scenarios.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn abilities(&self) -> &AbilityBook {
        &self.abilities
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}
