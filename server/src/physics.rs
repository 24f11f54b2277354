//! Ball integration, paddle and wall collisions, and goal detection.
//!
//! One call to [`step`] advances the arena by a single tick. Order within a
//! tick is fixed: integrate, primary ball against each paddle (left, right,
//! top, bottom), duplicates against each paddle, then walls.

use crate::arena::{Arena, Ball, Paddle};
use crate::config::MatchConfig;
use rand::Rng;
use shared::{Side, SideMap, ARENA_HEIGHT, ARENA_WIDTH};

/// Who is playing and which abilities bend the physics this tick.
#[derive(Debug, Clone, Default)]
pub struct PhysicsContext {
    pub occupied: SideMap<bool>,
    pub colors: SideMap<Option<String>>,
    pub stick: SideMap<bool>,
    pub magnet: SideMap<bool>,
    pub force: SideMap<bool>,
    pub zigzag: bool,
    /// Balls hold still (pause or post-goal freeze); collisions still resolve.
    pub frozen: bool,
}

impl PhysicsContext {
    pub fn player_count(&self) -> usize {
        self.occupied.0.iter().filter(|occupied| **occupied).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallOutcome {
    Bounce,
    Score(Side),
}

/// Advances every ball by one tick and returns the side that scored, if any.
pub fn step<R: Rng>(
    arena: &mut Arena,
    ctx: &PhysicsContext,
    config: &MatchConfig,
    rng: &mut R,
) -> Option<Side> {
    if !ctx.frozen {
        integrate(arena, ctx, config, rng);
    }

    for side in Side::ALL {
        if !ctx.occupied[side] {
            continue;
        }
        let paddle = arena.paddles[side];
        if ctx.magnet[side] {
            attract(&mut arena.ball, side, &paddle, config);
        }
        collide_paddle(&mut arena.ball, side, &paddle, ctx, config, config.hit_jitter, rng);
    }

    for side in Side::ALL {
        if !ctx.occupied[side] {
            continue;
        }
        let paddle = arena.paddles[side];
        for ball in arena.duplicates.iter_mut() {
            collide_paddle(
                ball,
                side,
                &paddle,
                ctx,
                config,
                config.duplicate_hit_jitter,
                rng,
            );
        }
    }

    let scored = resolve_walls(&mut arena.ball, ctx);
    for ball in arena.duplicates.iter_mut() {
        for edge in crossed_edges(ball).into_iter().flatten() {
            bounce_off(ball, edge);
        }
    }
    scored
}

fn integrate<R: Rng>(arena: &mut Arena, ctx: &PhysicsContext, config: &MatchConfig, rng: &mut R) {
    for ball in arena.balls_mut() {
        if ball.stuck_to.is_some() {
            continue;
        }
        ball.x += ball.dx;
        ball.y += ball.dy;
        ball.clamp_speed(config.max_ball_speed);
        if ctx.zigzag {
            ball.dx += (rng.gen::<f32>() - 0.5) * config.zigzag_jitter;
            ball.dy += (rng.gen::<f32>() - 0.5) * config.zigzag_jitter;
        }
    }
}

/// Pulls a free ball toward the paddle centre when it is within range.
pub fn attract(ball: &mut Ball, side: Side, paddle: &Paddle, config: &MatchConfig) {
    if ball.stuck_to.is_some() {
        return;
    }
    let (cx, cy) = paddle.center_point(side);
    let dx = cx - ball.x;
    let dy = cy - ball.y;
    if (dx * dx + dy * dy).sqrt() < config.magnet_range {
        ball.dx += dx * config.magnet_pull;
        ball.dy += dy * config.magnet_pull;
    }
}

/// Band test against the paddle face guarding `side`.
pub fn paddle_hit(ball: &Ball, side: Side, paddle: &Paddle) -> bool {
    let (lo, hi) = (paddle.position, paddle.position + paddle.size);
    match side {
        Side::Left => ball.x - ball.size <= side.face() && ball.y > lo && ball.y < hi,
        Side::Right => ball.x + ball.size >= side.face() && ball.y > lo && ball.y < hi,
        Side::Top => ball.y - ball.size <= side.face() && ball.x > lo && ball.x < hi,
        Side::Bottom => ball.y + ball.size >= side.face() && ball.x > lo && ball.x < hi,
    }
}

pub fn moving_toward(ball: &Ball, side: Side) -> bool {
    match side {
        Side::Left => ball.dx < 0.0,
        Side::Right => ball.dx > 0.0,
        Side::Top => ball.dy < 0.0,
        Side::Bottom => ball.dy > 0.0,
    }
}

fn collide_paddle<R: Rng>(
    ball: &mut Ball,
    side: Side,
    paddle: &Paddle,
    ctx: &PhysicsContext,
    config: &MatchConfig,
    jitter: f32,
    rng: &mut R,
) -> bool {
    if !paddle_hit(ball, side, paddle) || !moving_toward(ball, side) {
        return false;
    }

    ball.last_hit = Some(side);

    // Snap just outside the face so the ball cannot tunnel through.
    let outside = side.face() + side.outward_sign() * (ball.size + 1.0);
    if side.is_vertical() {
        ball.x = outside;
    } else {
        ball.y = outside;
    }

    if ctx.stick[side] {
        ball.stuck_to = Some(side);
        ball.pin_to(side, paddle);
        ball.dx = 0.0;
        ball.dy = 0.0;
        return true;
    }

    if ctx.force[side] {
        ball.dx *= config.force_factor;
        ball.dy *= config.force_factor;
    }

    if let Some(color) = &ctx.colors[side] {
        ball.color = color.clone();
    }

    reflect(ball, side, paddle);
    ball.dx += (rng.gen::<f32>() - 0.5) * jitter;
    ball.dy += (rng.gen::<f32>() - 0.5) * jitter;

    if !ctx.zigzag {
        ball.dx *= config.acceleration;
        ball.dy *= config.acceleration;
    }
    true
}

/// Sends the ball back out from the paddle. The further from the paddle
/// centre it lands, the steeper the angle; speed is preserved.
pub fn reflect(ball: &mut Ball, side: Side, paddle: &Paddle) {
    let speed = ball.speed();
    let along = if side.is_vertical() { ball.y } else { ball.x };
    let impact = ((along - paddle.center()) / (paddle.size / 2.0)).clamp(-1.0, 1.0);
    let parallel = speed * impact;
    let away = side.outward_sign() * (speed * speed - parallel * parallel).max(1.0).sqrt();

    if side.is_vertical() {
        ball.dy = parallel;
        ball.dx = away;
    } else {
        ball.dx = parallel;
        ball.dy = away;
    }
}

/// Edges the ball is beyond: at most one per axis, y axis first.
pub fn crossed_edges(ball: &Ball) -> [Option<Side>; 2] {
    let vertical = if ball.y < 0.0 {
        Some(Side::Top)
    } else if ball.y > ARENA_HEIGHT {
        Some(Side::Bottom)
    } else {
        None
    };
    let horizontal = if ball.x < 0.0 {
        Some(Side::Left)
    } else if ball.x > ARENA_WIDTH {
        Some(Side::Right)
    } else {
        None
    };
    [vertical, horizontal]
}

/// Decides whether crossing `edge` scores.
///
/// Fewer than two players is practice mode and every edge bounces. An edge
/// without a player is a backstop. A defended edge scores for the last
/// hitter, unless nobody hit the ball yet or the hitter is the defender.
pub fn wall_outcome(edge: Side, last_hit: Option<Side>, ctx: &PhysicsContext) -> WallOutcome {
    if ctx.player_count() < 2 || !ctx.occupied[edge] {
        return WallOutcome::Bounce;
    }
    match last_hit {
        Some(hitter) if hitter != edge => WallOutcome::Score(hitter),
        _ => WallOutcome::Bounce,
    }
}

/// Puts the ball back on the edge and points it into the arena.
pub fn bounce_off(ball: &mut Ball, edge: Side) {
    match edge {
        Side::Left => {
            ball.x = 0.0;
            ball.dx = ball.dx.abs();
        }
        Side::Right => {
            ball.x = ARENA_WIDTH;
            ball.dx = -ball.dx.abs();
        }
        Side::Top => {
            ball.y = 0.0;
            ball.dy = ball.dy.abs();
        }
        Side::Bottom => {
            ball.y = ARENA_HEIGHT;
            ball.dy = -ball.dy.abs();
        }
    }
}

fn resolve_walls(ball: &mut Ball, ctx: &PhysicsContext) -> Option<Side> {
    let mut scored = None;
    for edge in crossed_edges(ball).into_iter().flatten() {
        match wall_outcome(edge, ball.last_hit, ctx) {
            WallOutcome::Score(side) => scored = Some(side),
            WallOutcome::Bounce => bounce_off(ball, edge),
        }
    }
    scored
}

/// Launches a glued ball away from the paddle with a random sideways component.
pub fn release_ball<R: Rng>(ball: &mut Ball, side: Side, speed: f32, rng: &mut R) {
    ball.stuck_to = None;
    let away = side.outward_sign() * speed;
    let sideways = if rng.gen_bool(0.5) { speed } else { -speed };
    if side.is_vertical() {
        ball.dx = away;
        ball.dy = sideways;
    } else {
        ball.dy = away;
        ball.dx = sideways;
    }
}

/// Fans `count` copies of the primary ball out at evenly spaced angles.
pub fn spawn_duplicates(arena: &mut Arena, count: u8, default_speed: f32) {
    let speed = match arena.ball.speed() {
        s if s > 0.0 => s,
        _ => default_speed,
    };
    for i in 0..count {
        let angle = std::f32::consts::TAU * f32::from(i) / f32::from(count);
        let mut copy = arena.ball.clone().with_velocity(angle.cos() * speed, angle.sin() * speed);
        copy.stuck_to = None;
        arena.duplicates.push(copy);
    }
}

/// Reverses every ball along the activator's axis and paints it their color.
pub fn telekinesis_wave(arena: &mut Arena, side: Side, color: Option<&str>) {
    for ball in arena.balls_mut() {
        if side.is_vertical() {
            ball.dx = -ball.dx;
        } else {
            ball.dy = -ball.dy;
        }
        if let Some(color) = color {
            ball.color = color.to_string();
        }
    }
}

/// Shoves the opposing paddle closest to the primary ball away from it.
/// Returns the side that was pushed.
pub fn explosive_push(arena: &mut Arena, activator: Side, push: f32) -> Option<Side> {
    let (bx, by) = (arena.ball.x, arena.ball.y);
    let target = Side::ALL
        .into_iter()
        .filter(|side| *side != activator)
        .min_by(|a, b| {
            let da = distance_to_paddle(&arena.paddles[*a], *a, bx, by);
            let db = distance_to_paddle(&arena.paddles[*b], *b, bx, by);
            da.total_cmp(&db)
        })?;

    let paddle = &mut arena.paddles[target];
    let ball_along = if target.is_vertical() { by } else { bx };
    // Ball before the centre pushes the paddle forward along its axis.
    let delta = if ball_along < paddle.center() { push } else { -push };
    paddle.shift(target, delta);
    Some(target)
}

fn distance_to_paddle(paddle: &Paddle, side: Side, x: f32, y: f32) -> f32 {
    let (cx, cy) = paddle.center_point(side);
    ((cx - x).powi(2) + (cy - y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (Arena, PhysicsContext, MatchConfig, StdRng) {
        let arena = Arena::new(300, 4.0);
        let ctx = PhysicsContext {
            occupied: SideMap([true, true, false, false]),
            colors: SideMap([Some("red".to_string()), Some("blue".to_string()), None, None]),
            ..PhysicsContext::default()
        };
        (arena, ctx, MatchConfig::new(), StdRng::seed_from_u64(7))
    }

    fn ball_at(x: f32, y: f32, dx: f32, dy: f32) -> Ball {
        let mut ball = Ball::centered().with_velocity(dx, dy);
        ball.x = x;
        ball.y = y;
        ball
    }

    #[test]
    fn test_integration_moves_and_clamps_speed() {
        let (mut arena, ctx, config, mut rng) = setup();
        arena.ball = ball_at(400.0, 300.0, 30.0, 40.0);

        step(&mut arena, &ctx, &config, &mut rng);

        assert_eq!((arena.ball.x, arena.ball.y), (430.0, 340.0));
        assert_approx_eq!(arena.ball.speed(), config.max_ball_speed, 1e-3);
    }

    #[test]
    fn test_frozen_balls_do_not_move() {
        let (mut arena, mut ctx, config, mut rng) = setup();
        ctx.frozen = true;
        arena.ball = ball_at(400.0, 300.0, 4.0, 4.0);
        arena.duplicates.push(ball_at(100.0, 100.0, 3.0, 0.0));

        step(&mut arena, &ctx, &config, &mut rng);

        assert_eq!((arena.ball.x, arena.ball.y), (400.0, 300.0));
        assert_eq!(arena.duplicates[0].x, 100.0);
    }

    #[test]
    fn test_ball_bounces_off_left_paddle() {
        let (mut arena, ctx, config, mut rng) = setup();
        // Left paddle spans y in (250, 350).
        arena.ball = ball_at(30.0, 300.0, -6.0, 0.0);
        arena.ball.x += 6.0; // integration brings it back to 30

        let scored = step(&mut arena, &ctx, &config, &mut rng);

        assert_eq!(scored, None);
        assert!(arena.ball.dx > 0.0, "Ball should leave the left paddle");
        assert_eq!(arena.ball.last_hit, Some(Side::Left));
        assert_eq!(arena.ball.x, 20.0 + arena.ball.size + 1.0);
        assert_eq!(arena.ball.color, "red");
    }

    #[test]
    fn test_hit_preserves_speed_then_accelerates() {
        let (_, ctx, config, mut rng) = setup();
        let paddle = Paddle::new(Side::Right);
        let mut ball = ball_at(775.0, 300.0, 8.0, 0.0);

        assert!(collide_paddle(&mut ball, Side::Right, &paddle, &ctx, &config, 0.0, &mut rng));

        assert!(ball.dx < 0.0);
        assert_approx_eq!(ball.speed(), 8.0 * config.acceleration, 1e-3);
        assert_eq!(ball.x, 780.0 - ball.size - 1.0);
    }

    #[test]
    fn test_receding_ball_is_not_hit() {
        let (_, ctx, config, mut rng) = setup();
        let paddle = Paddle::new(Side::Left);
        let mut ball = ball_at(25.0, 300.0, 5.0, 0.0);

        assert!(!collide_paddle(&mut ball, Side::Left, &paddle, &ctx, &config, 0.0, &mut rng));
        assert_eq!(ball.dx, 5.0);
        assert_eq!(ball.last_hit, None);
    }

    #[test]
    fn test_impact_offset_steers_reflection() {
        let paddle = Paddle::new(Side::Left); // centre at 300
        let mut high = ball_at(25.0, 260.0, -8.0, 0.0);
        reflect(&mut high, Side::Left, &paddle);
        assert!(high.dy < 0.0, "Upper half sends the ball up");

        let mut low = ball_at(25.0, 340.0, -8.0, 0.0);
        reflect(&mut low, Side::Left, &paddle);
        assert!(low.dy > 0.0, "Lower half sends the ball down");
        assert_approx_eq!(low.speed(), 8.0, 1e-3);

        let mut centre = ball_at(400.0, 575.0, 3.0, 4.0);
        reflect(&mut centre, Side::Bottom, &Paddle::new(Side::Bottom));
        assert_approx_eq!(centre.dx, 0.0);
        assert_approx_eq!(centre.dy, -5.0);
    }

    #[test]
    fn test_unoccupied_paddle_does_not_collide() {
        let (mut arena, ctx, config, mut rng) = setup();
        // Top has no player, ball inside its band moving up.
        arena.ball = ball_at(400.0, 25.0, 0.0, -2.0);
        arena.ball.y += 2.0;

        step(&mut arena, &ctx, &config, &mut rng);
        assert!(arena.ball.dy < 0.0);
        assert_eq!(arena.ball.last_hit, None);
    }

    #[test]
    fn test_stick_glues_ball_to_paddle_centre() {
        let (mut arena, mut ctx, config, mut rng) = setup();
        ctx.stick[Side::Left] = true;
        ctx.frozen = true;
        arena.ball = ball_at(25.0, 270.0, -5.0, 1.0);

        step(&mut arena, &ctx, &config, &mut rng);

        assert_eq!(arena.ball.stuck_to, Some(Side::Left));
        assert_eq!((arena.ball.dx, arena.ball.dy), (0.0, 0.0));
        assert_eq!(arena.ball.y, arena.paddles[Side::Left].center());

        // A stuck ball is skipped by integration.
        ctx.frozen = false;
        ctx.zigzag = true;
        let before = arena.ball.clone();
        step(&mut arena, &ctx, &config, &mut rng);
        assert_eq!(arena.ball, before);
    }

    #[test]
    fn test_stick_glues_duplicates_too() {
        let (mut arena, mut ctx, config, mut rng) = setup();
        ctx.stick[Side::Left] = true;
        ctx.frozen = true;
        arena.ball = ball_at(400.0, 300.0, 0.0, 0.0);
        arena.duplicates.push(ball_at(25.0, 270.0, -5.0, 1.0));

        step(&mut arena, &ctx, &config, &mut rng);

        let duplicate = &arena.duplicates[0];
        assert_eq!(duplicate.stuck_to, Some(Side::Left));
        assert_eq!(duplicate.last_hit, Some(Side::Left));
        assert_eq!((duplicate.dx, duplicate.dy), (0.0, 0.0));
        assert_eq!(duplicate.y, arena.paddles[Side::Left].center());
        assert_eq!(arena.ball.stuck_to, None);
    }

    #[test]
    fn test_zigzag_perturbs_every_free_ball() {
        let (mut arena, mut ctx, config, mut rng) = setup();
        ctx.zigzag = true;
        arena.ball = ball_at(400.0, 300.0, 3.0, 0.0);
        arena.duplicates.push(ball_at(200.0, 200.0, 0.0, 3.0));

        step(&mut arena, &ctx, &config, &mut rng);

        // Positions advance with the old velocity; the jitter lands afterwards.
        assert_eq!((arena.ball.x, arena.ball.y), (403.0, 300.0));
        assert_eq!((arena.duplicates[0].x, arena.duplicates[0].y), (200.0, 203.0));
        assert_ne!((arena.ball.dx, arena.ball.dy), (3.0, 0.0));
        assert_ne!((arena.duplicates[0].dx, arena.duplicates[0].dy), (0.0, 3.0));
        let limit = config.zigzag_jitter / 2.0;
        assert!((arena.ball.dx - 3.0).abs() <= limit && arena.ball.dy.abs() <= limit);
    }

    #[test]
    fn test_force_multiplies_hit_speed() {
        let (_, mut ctx, config, mut rng) = setup();
        ctx.force[Side::Right] = true;
        let paddle = Paddle::new(Side::Right);
        let mut ball = ball_at(775.0, 300.0, 6.0, 0.0);

        collide_paddle(&mut ball, Side::Right, &paddle, &ctx, &config, 0.0, &mut rng);
        assert_approx_eq!(ball.speed(), 6.0 * 1.5 * config.acceleration, 1e-3);
    }

    #[test]
    fn test_zigzag_replaces_acceleration() {
        let (_, mut ctx, config, mut rng) = setup();
        ctx.zigzag = true;
        let paddle = Paddle::new(Side::Left);
        let mut ball = ball_at(25.0, 300.0, -6.0, 0.0);

        collide_paddle(&mut ball, Side::Left, &paddle, &ctx, &config, 0.0, &mut rng);
        assert_approx_eq!(ball.speed(), 6.0, 1e-3);
    }

    #[test]
    fn test_magnet_pulls_within_range_only() {
        let config = MatchConfig::new();
        let paddle = Paddle::new(Side::Left); // centre point (20, 300)

        let mut near = ball_at(120.0, 300.0, 0.0, 0.0);
        attract(&mut near, Side::Left, &paddle, &config);
        assert_approx_eq!(near.dx, -100.0 * config.magnet_pull);
        assert_approx_eq!(near.dy, 0.0);

        let mut far = ball_at(400.0, 300.0, 1.0, 1.0);
        attract(&mut far, Side::Left, &paddle, &config);
        assert_eq!((far.dx, far.dy), (1.0, 1.0));
    }

    #[test]
    fn test_practice_mode_always_bounces() {
        let ctx = PhysicsContext {
            occupied: SideMap([true, false, false, false]),
            ..PhysicsContext::default()
        };
        for edge in Side::ALL {
            assert_eq!(wall_outcome(edge, Some(Side::Left), &ctx), WallOutcome::Bounce);
        }
    }

    #[test]
    fn test_wall_outcome_rules() {
        let ctx = PhysicsContext {
            occupied: SideMap([true, true, false, true]),
            ..PhysicsContext::default()
        };
        assert_eq!(
            wall_outcome(Side::Right, Some(Side::Left), &ctx),
            WallOutcome::Score(Side::Left)
        );
        // Undefended edge is a backstop.
        assert_eq!(wall_outcome(Side::Top, Some(Side::Left), &ctx), WallOutcome::Bounce);
        // Own edge never scores.
        assert_eq!(wall_outcome(Side::Right, Some(Side::Right), &ctx), WallOutcome::Bounce);
        // Nobody touched the ball yet.
        assert_eq!(wall_outcome(Side::Bottom, None, &ctx), WallOutcome::Bounce);
    }

    #[test]
    fn test_goal_scored_for_last_hitter() {
        let (mut arena, ctx, config, mut rng) = setup();
        arena.ball = ball_at(805.0, 100.0, 5.0, 0.0);
        arena.ball.x -= 5.0;
        arena.ball.last_hit = Some(Side::Left);

        assert_eq!(step(&mut arena, &ctx, &config, &mut rng), Some(Side::Left));
    }

    #[test]
    fn test_bounce_points_ball_inward() {
        let mut ball = ball_at(-3.0, 610.0, -2.0, 5.0);
        for edge in crossed_edges(&ball).into_iter().flatten() {
            bounce_off(&mut ball, edge);
        }
        assert_eq!((ball.x, ball.y), (0.0, ARENA_HEIGHT));
        assert_eq!((ball.dx, ball.dy), (2.0, -5.0));
    }

    #[test]
    fn test_duplicates_never_score() {
        let (mut arena, ctx, config, mut rng) = setup();
        arena.ball = ball_at(400.0, 300.0, 0.0, 0.0);
        let mut dup = ball_at(810.0, 100.0, 4.0, 0.0);
        dup.last_hit = Some(Side::Left);
        arena.duplicates.push(dup);

        assert_eq!(step(&mut arena, &ctx, &config, &mut rng), None);
        assert_eq!(arena.duplicates[0].x, ARENA_WIDTH);
        assert!(arena.duplicates[0].dx < 0.0);
    }

    #[test]
    fn test_release_ball_launches_away_from_paddle() {
        let mut rng = StdRng::seed_from_u64(1);
        for side in Side::ALL {
            let mut ball = Ball::centered();
            ball.stuck_to = Some(side);
            release_ball(&mut ball, side, 4.0, &mut rng);

            assert_eq!(ball.stuck_to, None);
            let (away, sideways) = if side.is_vertical() {
                (ball.dx, ball.dy)
            } else {
                (ball.dy, ball.dx)
            };
            assert_eq!(away, side.outward_sign() * 4.0);
            assert_eq!(sideways.abs(), 4.0);
        }
    }

    #[test]
    fn test_spawn_duplicates_keeps_speed() {
        let mut arena = Arena::new(300, 4.0);
        arena.ball = ball_at(200.0, 150.0, 3.0, 4.0);
        spawn_duplicates(&mut arena, 4, 6.0);

        assert_eq!(arena.duplicates.len(), 4);
        for dup in &arena.duplicates {
            assert_approx_eq!(dup.speed(), 5.0, 1e-4);
            assert_eq!((dup.x, dup.y), (200.0, 150.0));
        }
        assert_approx_eq!(arena.duplicates[0].dx, 5.0, 1e-4);
        assert_approx_eq!(arena.duplicates[1].dy, 5.0, 1e-4);
    }

    #[test]
    fn test_spawn_duplicates_from_resting_ball() {
        let mut arena = Arena::new(300, 4.0);
        arena.ball = Ball::centered();
        spawn_duplicates(&mut arena, 3, 6.0);
        for dup in &arena.duplicates {
            assert_approx_eq!(dup.speed(), 6.0, 1e-4);
        }
    }

    #[test]
    fn test_telekinesis_wave_flips_primary_axis() {
        let mut arena = Arena::new(300, 4.0);
        arena.ball = ball_at(400.0, 300.0, 4.0, -3.0);
        arena.ball.last_hit = Some(Side::Right);
        arena.duplicates.push(ball_at(100.0, 100.0, -2.0, 5.0));

        telekinesis_wave(&mut arena, Side::Left, Some("gold"));
        assert_eq!((arena.ball.dx, arena.ball.dy), (-4.0, -3.0));
        assert_eq!((arena.duplicates[0].dx, arena.duplicates[0].dy), (2.0, 5.0));
        assert_eq!(arena.ball.color, "gold");
        assert_eq!(arena.ball.last_hit, Some(Side::Right));

        telekinesis_wave(&mut arena, Side::Top, None);
        assert_eq!(arena.ball.dy, 3.0);
        assert_eq!(arena.duplicates[0].color, "gold");
    }

    #[test]
    fn test_explosive_push_moves_closest_opponent() {
        let mut arena = Arena::new(300, 4.0);
        // Ball near the right paddle, above its centre (300).
        arena.ball = ball_at(700.0, 280.0, 0.0, 0.0);

        let pushed = explosive_push(&mut arena, Side::Left, 60.0);
        assert_eq!(pushed, Some(Side::Right));
        assert_eq!(arena.paddles[Side::Right].position, 310.0);

        // Clamped at the end of travel.
        arena.paddles[Side::Right].position = 480.0;
        explosive_push(&mut arena, Side::Left, 60.0);
        assert_eq!(arena.paddles[Side::Right].position, 500.0);
    }

    #[test]
    fn test_explosive_push_skips_activator() {
        let mut arena = Arena::new(300, 4.0);
        arena.ball = ball_at(40.0, 320.0, 0.0, 0.0);

        let pushed = explosive_push(&mut arena, Side::Left, 60.0);
        assert_ne!(pushed, Some(Side::Left));
        assert_eq!(arena.paddles[Side::Left].position, 250.0);
    }
}
