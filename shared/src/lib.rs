//! Wire protocol and domain vocabulary shared by the match server and its clients.
//!
//! Every datagram exchanged between a client and the server is one
//! bincode-encoded [`Packet`]. The arena is a fixed 800x600 playfield with one
//! paddle per compass [`Side`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Index, IndexMut};

pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 600.0;
/// Distance between an arena edge and the face of the paddle guarding it.
pub const WALL_INSET: f32 = 20.0;
pub const DEFAULT_PAD_SIZE: f32 = 100.0;
pub const BALL_SIZE: f32 = 10.0;
pub const MAX_PLAYERS: usize = 4;
pub const PROTOCOL_VERSION: u32 = 1;
pub const DEFAULT_COLOR: &str = "white";
/// Reported as the winner's name when nobody is known for the winning side.
pub const UNKNOWN_PLAYER: &str = "--";

/// One of the four paddle positions around the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Enumeration order used for side assignment, collision and tie-breaking.
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
            Side::Top => 2,
            Side::Bottom => 3,
        }
    }

    /// Left and right paddles travel along the y axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// Length of the axis the paddle travels along.
    pub fn axis_length(self) -> f32 {
        if self.is_vertical() {
            ARENA_HEIGHT
        } else {
            ARENA_WIDTH
        }
    }

    /// Paddle offset at the start of a match, centred on its axis.
    pub fn default_position(self) -> f32 {
        (self.axis_length() - DEFAULT_PAD_SIZE) / 2.0
    }

    /// Coordinate of the paddle face on the axis perpendicular to its travel.
    pub fn face(self) -> f32 {
        match self {
            Side::Left | Side::Top => WALL_INSET,
            Side::Right => ARENA_WIDTH - WALL_INSET,
            Side::Bottom => ARENA_HEIGHT - WALL_INSET,
        }
    }

    /// Sign of the velocity component that points away from this paddle.
    pub fn outward_sign(self) -> f32 {
        match self {
            Side::Left | Side::Top => 1.0,
            Side::Right | Side::Bottom => -1.0,
        }
    }

    /// Whether a paddle on this side moves for the given direction.
    pub fn accepts(self, direction: Direction) -> bool {
        match direction {
            Direction::Up | Direction::Down => self.is_vertical(),
            Direction::Left | Direction::Right => !self.is_vertical(),
        }
    }
}

/// A value for every side, indexable by [`Side`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SideMap<T>(pub [T; 4]);

impl<T: Clone> SideMap<T> {
    pub fn splat(value: T) -> Self {
        Self([value.clone(), value.clone(), value.clone(), value])
    }
}

impl<T> SideMap<T> {
    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self(Side::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        Side::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        &self.0[side.index()]
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        &mut self.0[side.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Sign of the position change along the paddle axis.
    pub fn sign(self) -> f32 {
        match self {
            Direction::Up | Direction::Left => -1.0,
            Direction::Down | Direction::Right => 1.0,
        }
    }
}

/// Power-up a player picks in the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Neon hit: balls leave this paddle 1.5x faster.
    Force,
    Grow,
    Magnet,
    ZigzagBall,
    ShrinkOpponent,
    GhostPaddle,
    InvertControls,
    /// Blurs every opponent's screen ("desconcentrar").
    Distract,
    ExplosiveBall,
    Stick,
    Telekinesis,
    /// Freezes the match for everyone but the activator.
    Stop,
    DuplicateBall,
}

impl AbilityKind {
    pub const ALL: [AbilityKind; 13] = [
        AbilityKind::Force,
        AbilityKind::Grow,
        AbilityKind::Magnet,
        AbilityKind::ZigzagBall,
        AbilityKind::ShrinkOpponent,
        AbilityKind::GhostPaddle,
        AbilityKind::InvertControls,
        AbilityKind::Distract,
        AbilityKind::ExplosiveBall,
        AbilityKind::Stick,
        AbilityKind::Telekinesis,
        AbilityKind::Stop,
        AbilityKind::DuplicateBall,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectPhase {
    Started,
    Ended,
}

/// Notification that an ability changed something clients should render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityEffect {
    pub side: Side,
    pub ability: AbilityKind,
    pub phase: EffectPhase,
    pub color: Option<String>,
    /// Number of balls spawned by a duplication.
    pub multiplier: Option<u8>,
}

impl AbilityEffect {
    pub fn started(side: Side, ability: AbilityKind) -> Self {
        Self {
            side,
            ability,
            phase: EffectPhase::Started,
            color: None,
            multiplier: None,
        }
    }

    pub fn ended(side: Side, ability: AbilityKind) -> Self {
        Self {
            phase: EffectPhase::Ended,
            ..Self::started(side, ability)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub side: Side,
    pub name: String,
    pub color: String,
    pub ability: Option<AbilityKind>,
    pub gradient: Option<String>,
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallView {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub size: f32,
    pub color: String,
}

/// Full arena snapshot broadcast after every physics tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub players: HashMap<u32, PlayerView>,
    pub positions: SideMap<f32>,
    pub pad_size: SideMap<f32>,
    pub ball: BallView,
    pub duplicate_balls: Vec<BallView>,
    pub score: SideMap<u32>,
    pub remaining_time: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    pub side: Side,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Client -> server
    Connect {
        client_version: u32,
    },
    Join {
        name: String,
        color: String,
        ability: Option<AbilityKind>,
        gradient: Option<String>,
        background: Option<String>,
    },
    Move {
        direction: Direction,
        fast: bool,
    },
    UseAbility,
    ResetGame,
    Heartbeat,
    Disconnect,

    // Server -> client
    Connected {
        client_id: u32,
    },
    Disconnected {
        reason: String,
    },
    AssignedSide {
        side: Side,
    },
    ResetToJoin,
    PlayersReady,
    Full {
        reason: String,
    },
    PlayerLeft {
        side: Side,
    },
    State(StateSnapshot),
    BallReset,
    AbilityEffect(AbilityEffect),
    PointEffect {
        side: Side,
        color: String,
        background: Option<String>,
    },
    GameOver {
        winner: Winner,
        score: SideMap<u32>,
    },
    GameReset {
        remaining_time: u32,
    },
    Defeat {
        winner: Winner,
    },
}

impl Packet {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
