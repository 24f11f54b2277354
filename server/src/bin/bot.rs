//! Scripted player: connects, joins, follows the ball with its paddle and
//! fires its ability whenever it can.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{debug, info, warn};
use shared::{AbilityKind, Direction, Packet, Side, StateSnapshot, PROTOCOL_VERSION};
use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep_until, Instant};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,
    #[clap(short, long, default_value = "bot")]
    name: String,
    #[clap(short, long, default_value = "white")]
    color: String,
    /// Ability to pick, e.g. grow, stick, duplicate-ball
    #[clap(short, long, default_value = "grow")]
    ability: String,
    /// Seconds to play before leaving
    #[clap(short, long, default_value = "60")]
    duration: u64,
}

fn parse_ability(name: &str) -> Option<AbilityKind> {
    let kind = match name.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
        "force" | "neon" => AbilityKind::Force,
        "grow" => AbilityKind::Grow,
        "magnet" => AbilityKind::Magnet,
        "zigzag" | "zigzagball" => AbilityKind::ZigzagBall,
        "shrink" | "shrinkopponent" => AbilityKind::ShrinkOpponent,
        "ghost" | "ghostpaddle" => AbilityKind::GhostPaddle,
        "invert" | "invertcontrols" => AbilityKind::InvertControls,
        "distract" | "desconcentrar" => AbilityKind::Distract,
        "explosive" | "explosiveball" => AbilityKind::ExplosiveBall,
        "stick" => AbilityKind::Stick,
        "telekinesis" => AbilityKind::Telekinesis,
        "stop" => AbilityKind::Stop,
        "duplicate" | "duplicateball" => AbilityKind::DuplicateBall,
        _ => return None,
    };
    Some(kind)
}

/// Direction that brings the paddle centre toward the ball, if any.
fn steer(side: Side, state: &StateSnapshot) -> Option<Direction> {
    let centre = state.positions[side] + state.pad_size[side] / 2.0;
    let target = if side.is_vertical() { state.ball.y } else { state.ball.x };
    let offset = target - centre;
    if offset.abs() < state.pad_size[side] / 4.0 {
        return None;
    }
    let direction = match (side.is_vertical(), offset > 0.0) {
        (true, true) => Direction::Down,
        (true, false) => Direction::Up,
        (false, true) => Direction::Right,
        (false, false) => Direction::Left,
    };
    Some(direction)
}

async fn send(socket: &UdpSocket, packet: &Packet, server: SocketAddr) -> Result<(), Box<dyn Error>> {
    socket.send_to(&serialize(packet)?, server).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let ability = parse_ability(&args.ability);
    if ability.is_none() {
        warn!("Unknown ability '{}', joining without one", args.ability);
    }

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    info!("Bot socket bound to {}", socket.local_addr()?);

    send(
        &socket,
        &Packet::Connect {
            client_version: PROTOCOL_VERSION,
        },
        args.server,
    )
    .await?;

    let mut buf = [0u8; 4096];
    let mut side: Option<Side> = None;
    let mut state: Option<StateSnapshot> = None;
    let mut joined = false;

    let mut heartbeat = interval(Duration::from_secs(1));
    let mut control = interval(Duration::from_millis(50));
    let mut ability_timer = interval(Duration::from_secs(3));
    let deadline = Instant::now() + Duration::from_secs(args.duration);

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, _) = received?;
                let packet = match deserialize::<Packet>(&buf[..len]) {
                    Ok(packet) => packet,
                    Err(e) => {
                        warn!("Failed to deserialize packet: {}", e);
                        continue;
                    }
                };

                match packet {
                    Packet::Connected { client_id } => info!("Connected as client {}", client_id),
                    Packet::AssignedSide { side: assigned } => {
                        info!("Assigned side {:?}", assigned);
                        side = Some(assigned);
                    }
                    Packet::ResetToJoin => {
                        let join = Packet::Join {
                            name: args.name.clone(),
                            color: args.color.clone(),
                            ability,
                            gradient: None,
                            background: None,
                        };
                        send(&socket, &join, args.server).await?;
                        joined = true;
                    }
                    Packet::State(snapshot) => state = Some(snapshot),
                    Packet::Full { reason } | Packet::Disconnected { reason } => {
                        warn!("Refused by server: {}", reason);
                        return Ok(());
                    }
                    Packet::GameOver { winner, score } => {
                        info!("Game over, {} ({:?}) won: {:?}", winner.name, winner.side, score.0);
                        break;
                    }
                    other => debug!("Received {:?}", other),
                }
            },

            _ = heartbeat.tick() => {
                send(&socket, &Packet::Heartbeat, args.server).await?;
            },

            _ = control.tick() => {
                if let (Some(side), Some(state)) = (side, state.as_ref()) {
                    if let Some(direction) = steer(side, state) {
                        send(&socket, &Packet::Move { direction, fast: false }, args.server).await?;
                    }
                }
            },

            _ = ability_timer.tick() => {
                if joined && ability.is_some() {
                    send(&socket, &Packet::UseAbility, args.server).await?;
                }
            },

            _ = sleep_until(deadline) => {
                info!("Play time over");
                break;
            },
        }
    }

    send(&socket, &Packet::Disconnect, args.server).await?;
    info!("Bot finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{BallView, SideMap};
    use std::collections::HashMap;

    fn state_with_ball(x: f32, y: f32) -> StateSnapshot {
        StateSnapshot {
            players: HashMap::new(),
            positions: SideMap::from_fn(Side::default_position),
            pad_size: SideMap::splat(100.0),
            ball: BallView {
                x,
                y,
                dx: 0.0,
                dy: 0.0,
                size: 10.0,
                color: "white".to_string(),
            },
            duplicate_balls: vec![],
            score: SideMap::splat(0),
            remaining_time: 300,
        }
    }

    #[test]
    fn test_parse_ability_names() {
        assert_eq!(parse_ability("grow"), Some(AbilityKind::Grow));
        assert_eq!(parse_ability("duplicate-ball"), Some(AbilityKind::DuplicateBall));
        assert_eq!(parse_ability("ZigZag_Ball"), Some(AbilityKind::ZigzagBall));
        assert_eq!(parse_ability("desconcentrar"), Some(AbilityKind::Distract));
        assert_eq!(parse_ability("teleport"), None);
    }

    #[test]
    fn test_steer_follows_ball() {
        assert_eq!(steer(Side::Left, &state_with_ball(100.0, 500.0)), Some(Direction::Down));
        assert_eq!(steer(Side::Right, &state_with_ball(100.0, 50.0)), Some(Direction::Up));
        assert_eq!(steer(Side::Top, &state_with_ball(100.0, 300.0)), Some(Direction::Left));
        assert_eq!(steer(Side::Bottom, &state_with_ball(700.0, 300.0)), Some(Direction::Right));
        assert_eq!(steer(Side::Left, &state_with_ball(100.0, 300.0)), None);
    }
}
