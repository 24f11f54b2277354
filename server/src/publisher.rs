//! Outbound notifications produced by the match.
//!
//! The engine never touches sockets. It queues packets in an [`Outbox`]
//! addressed to one client or to everybody, and the network layer drains the
//! queue after every mutation.

use crate::arena::Arena;
use crate::roster::{ClientId, Roster};
use shared::{Packet, SideMap, StateSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    Client(ClientId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub target: Target,
    pub packet: Packet,
}

#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Outbound>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_all(&mut self, packet: Packet) {
        self.queue.push(Outbound {
            target: Target::All,
            packet,
        });
    }

    pub fn to_client(&mut self, client_id: ClientId, packet: Packet) {
        self.queue.push(Outbound {
            target: Target::Client(client_id),
            packet,
        });
    }

    pub fn drain(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> &[Outbound] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Read-only copy of everything clients render.
pub fn snapshot(arena: &Arena, roster: &Roster) -> StateSnapshot {
    StateSnapshot {
        players: roster.views(),
        positions: SideMap::from_fn(|side| arena.paddles[side].position),
        pad_size: SideMap::from_fn(|side| arena.paddles[side].size),
        ball: arena.ball.view(),
        duplicate_balls: arena.duplicates.iter().map(|b| b.view()).collect(),
        score: arena.scores,
        remaining_time: arena.clock.remaining_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Ball;
    use crate::roster::Profile;
    use shared::Side;

    #[test]
    fn test_outbox_addresses_and_drains() {
        let mut outbox = Outbox::new();
        outbox.to_all(Packet::PlayersReady);
        outbox.to_client(3, Packet::ResetToJoin);
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.pending()[1].target, Target::Client(3));

        let drained = outbox.drain();
        assert_eq!(drained[0].target, Target::All);
        assert_eq!(drained[0].packet, Packet::PlayersReady);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_snapshot_copies_arena() {
        let mut arena = Arena::new(120, 4.0);
        arena.paddles[Side::Top].position = 10.0;
        arena.paddles[Side::Left].size = 250.0;
        arena.scores[Side::Right] = 2;
        arena.duplicates.push(Ball::centered().with_velocity(1.0, 2.0));

        let mut roster = Roster::new();
        roster.join(
            9,
            Profile {
                name: "zed".to_string(),
                color: "cyan".to_string(),
                ..Profile::default()
            },
        );

        let state = snapshot(&arena, &roster);
        assert_eq!(state.positions[Side::Top], 10.0);
        assert_eq!(state.pad_size[Side::Left], 250.0);
        assert_eq!(state.score[Side::Right], 2);
        assert_eq!(state.remaining_time, 120);
        assert_eq!(state.duplicate_balls.len(), 1);
        assert_eq!(state.duplicate_balls[0].dy, 2.0);
        assert_eq!(state.players[&9].name, "zed");
        assert_eq!(state.players[&9].side, Side::Left);
    }
}
