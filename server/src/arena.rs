//! Passive match state: paddles, scores, balls and the match clock.

use shared::{
    BallView, Side, SideMap, ARENA_HEIGHT, ARENA_WIDTH, BALL_SIZE, DEFAULT_COLOR,
    DEFAULT_PAD_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    /// Offset along the side's travel axis, within `[0, axis_length - size]`.
    pub position: f32,
    pub size: f32,
}

impl Paddle {
    pub fn new(side: Side) -> Self {
        Self {
            position: side.default_position(),
            size: DEFAULT_PAD_SIZE,
        }
    }

    pub fn center(&self) -> f32 {
        self.position + self.size / 2.0
    }

    pub fn max_position(&self, side: Side) -> f32 {
        (side.axis_length() - self.size).max(0.0)
    }

    /// Moves the paddle by `delta`, clamped to its travel range.
    pub fn shift(&mut self, side: Side, delta: f32) {
        self.position = (self.position + delta).clamp(0.0, self.max_position(side));
    }

    /// Centre of the paddle face in arena coordinates.
    pub fn center_point(&self, side: Side) -> (f32, f32) {
        if side.is_vertical() {
            (side.face(), self.center())
        } else {
            (self.center(), side.face())
        }
    }
}

/// The primary ball and every duplicate share this record.
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub size: f32,
    pub color: String,
    pub last_hit: Option<Side>,
    /// Paddle this ball is glued to.
    pub stuck_to: Option<Side>,
}

impl Ball {
    /// Stationary ball at the arena centre.
    pub fn centered() -> Self {
        Self {
            x: ARENA_WIDTH / 2.0,
            y: ARENA_HEIGHT / 2.0,
            dx: 0.0,
            dy: 0.0,
            size: BALL_SIZE,
            color: DEFAULT_COLOR.to_string(),
            last_hit: None,
            stuck_to: None,
        }
    }

    pub fn with_velocity(mut self, dx: f32, dy: f32) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    pub fn speed(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    /// Scales the velocity down so its magnitude does not exceed `max`.
    pub fn clamp_speed(&mut self, max: f32) {
        let speed = self.speed();
        if speed > max {
            self.dx *= max / speed;
            self.dy *= max / speed;
        }
    }

    /// Pins the ball's cross-axis coordinate to the centre of a paddle.
    pub fn pin_to(&mut self, side: Side, paddle: &Paddle) {
        if side.is_vertical() {
            self.y = paddle.center();
        } else {
            self.x = paddle.center();
        }
    }

    pub fn view(&self) -> BallView {
        BallView {
            x: self.x,
            y: self.y,
            dx: self.dx,
            dy: self.dy,
            size: self.size,
            color: self.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchClock {
    pub remaining_time: u32,
    pub game_over: bool,
    pub is_paused: bool,
    /// Side allowed to move while the match is paused.
    pub stopper_side: Option<Side>,
    /// Engine time until which balls are not integrated.
    pub ball_frozen_until: Option<u64>,
}

impl MatchClock {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            remaining_time: duration_secs,
            game_over: false,
            is_paused: false,
            stopper_side: None,
            ball_frozen_until: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    pub paddles: SideMap<Paddle>,
    pub scores: SideMap<u32>,
    pub ball: Ball,
    pub duplicates: Vec<Ball>,
    pub clock: MatchClock,
}

impl Arena {
    /// Fresh arena; the first ball launches diagonally without a freeze.
    pub fn new(duration_secs: u32, launch_speed: f32) -> Self {
        Self {
            paddles: SideMap::from_fn(Paddle::new),
            scores: SideMap::splat(0),
            ball: Ball::centered().with_velocity(launch_speed, launch_speed),
            duplicates: Vec::new(),
            clock: MatchClock::new(duration_secs),
        }
    }

    /// Every ball, primary first.
    pub fn balls_mut(&mut self) -> impl Iterator<Item = &mut Ball> {
        std::iter::once(&mut self.ball).chain(self.duplicates.iter_mut())
    }

    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        std::iter::once(&self.ball).chain(self.duplicates.iter())
    }

    /// First side in enumeration order with the highest score.
    pub fn leader(&self) -> Side {
        let mut best = Side::Left;
        for side in Side::ALL {
            if self.scores[side] > self.scores[best] {
                best = side;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_new_arena_defaults() {
        let arena = Arena::new(300, 4.0);
        assert_eq!(arena.paddles[Side::Left].position, 250.0);
        assert_eq!(arena.paddles[Side::Right].position, 250.0);
        assert_eq!(arena.paddles[Side::Top].position, 350.0);
        assert_eq!(arena.paddles[Side::Bottom].position, 350.0);
        for side in Side::ALL {
            assert_eq!(arena.paddles[side].size, DEFAULT_PAD_SIZE);
            assert_eq!(arena.scores[side], 0);
        }
        assert_eq!((arena.ball.x, arena.ball.y), (400.0, 300.0));
        assert_eq!((arena.ball.dx, arena.ball.dy), (4.0, 4.0));
        assert_eq!(arena.clock.remaining_time, 300);
        assert!(arena.duplicates.is_empty());
    }

    #[test]
    fn test_paddle_shift_clamps() {
        let mut paddle = Paddle::new(Side::Left);
        paddle.shift(Side::Left, -1_000.0);
        assert_eq!(paddle.position, 0.0);
        paddle.shift(Side::Left, 1_000.0);
        assert_eq!(paddle.position, 500.0);

        let mut top = Paddle::new(Side::Top);
        top.shift(Side::Top, 1_000.0);
        assert_eq!(top.position, 700.0);
    }

    #[test]
    fn test_oversized_paddle_pins_to_zero() {
        let mut paddle = Paddle::new(Side::Right);
        paddle.size = 650.0;
        paddle.shift(Side::Right, 10.0);
        assert_eq!(paddle.position, 0.0);
    }

    #[test]
    fn test_ball_speed_clamp_preserves_direction() {
        let mut ball = Ball::centered().with_velocity(30.0, 40.0);
        ball.clamp_speed(16.0);
        assert_approx_eq!(ball.speed(), 16.0, 1e-4);
        assert_approx_eq!(ball.dx / ball.dy, 0.75, 1e-4);

        let mut slow = Ball::centered().with_velocity(3.0, 4.0);
        slow.clamp_speed(16.0);
        assert_eq!((slow.dx, slow.dy), (3.0, 4.0));
    }

    #[test]
    fn test_pin_to_paddle_centre() {
        let paddle = Paddle {
            position: 100.0,
            size: 100.0,
        };
        let mut ball = Ball::centered();
        ball.pin_to(Side::Left, &paddle);
        assert_eq!((ball.x, ball.y), (400.0, 150.0));
        ball.pin_to(Side::Bottom, &paddle);
        assert_eq!((ball.x, ball.y), (150.0, 150.0));
        assert_eq!(paddle.center_point(Side::Right), (780.0, 150.0));
    }

    #[test]
    fn test_leader_breaks_ties_by_enumeration() {
        let mut arena = Arena::new(300, 4.0);
        assert_eq!(arena.leader(), Side::Left);
        arena.scores[Side::Top] = 3;
        arena.scores[Side::Bottom] = 3;
        assert_eq!(arena.leader(), Side::Top);
        arena.scores[Side::Bottom] = 4;
        assert_eq!(arena.leader(), Side::Bottom);
    }
}
