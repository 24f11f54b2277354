//! # Quad Pong Server Library
//!
//! Authoritative match server for four-sided Pong. Up to four players each
//! guard one edge of an 800x600 arena; the server owns the ball(s), resolves
//! every collision and goal, and runs the power-up abilities that bend the
//! rules for a few seconds at a time.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the definitive physics. Clients only send intents (join,
//! move, use ability, reset) and render the snapshots they receive.
//!
//! ### Roster
//! Sides are handed out in a fixed order (left, right, top, bottom). A side
//! whose player leaves keeps its paddle as a wall.
//!
//! ### Abilities
//! Each (side, ability) pair runs a small state machine: idle, active,
//! cooldown. Phase changes are driven by cancellable engine timers.
//!
//! ## Architecture Design
//!
//! ### Single Match Owner
//! One task owns the [`game::Game`]. Network receive, send and timeout
//! checking run as separate tasks and talk to it over channels, so the match
//! state is never shared and needs no locking.
//!
//! ### Engine Clock
//! The match never reads the wall clock. The owner advances it with
//! [`game::Game::advance_to`], which fires due timers in deadline order. This
//! keeps the engine deterministic under test.
//!
//! ## Module Organization
//!
//! - `arena`: paddles, balls, scores and the match clock
//! - `roster`: side assignment and player profiles
//! - `abilities`: per-side ability state machine
//! - `physics`: integration, collisions, walls and goals
//! - `timers`: cancellable deferred events
//! - `game`: the match itself, tying the above together
//! - `publisher`: outbound packet queue and snapshots
//! - `config`: match tuning and ability timings
//! - `client_manager`: connection table and idle timeouts
//! - `network`: UDP server driving the match
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::MatchConfig;
//! use server::game::Game;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let game = Game::new(MatchConfig::default());
//!     let mut server = Server::new("127.0.0.1:8080", game, 16).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod abilities;
pub mod arena;
pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;
pub mod physics;
pub mod publisher;
pub mod roster;
pub mod timers;
