//! Player roster: which client controls which side.
//!
//! Sides are handed out in enumeration order (left, right, top, bottom) and a
//! side is never held by two players at once. Removing a player frees the side
//! but leaves its paddle in the arena as a wall.

use log::info;
use shared::{AbilityKind, PlayerView, Side, SideMap, DEFAULT_COLOR, MAX_PLAYERS};
use std::collections::HashMap;

pub type ClientId = u32;

/// A joined client and the lobby choices it made.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub side: Side,
    pub name: String,
    pub color: String,
    pub ability: Option<AbilityKind>,
    pub gradient: Option<String>,
    pub background: Option<String>,
}

/// Lobby customisation sent with a join request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub name: String,
    pub color: String,
    pub ability: Option<AbilityKind>,
    pub gradient: Option<String>,
    pub background: Option<String>,
}

impl Player {
    fn apply(&mut self, profile: Profile) {
        self.name = profile.name;
        self.color = if profile.color.is_empty() {
            DEFAULT_COLOR.to_string()
        } else {
            profile.color
        };
        self.ability = profile.ability;
        self.gradient = profile.gradient;
        self.background = profile.background;
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            side: self.side,
            name: self.name.clone(),
            color: self.color.clone(),
            ability: self.ability,
            gradient: self.gradient.clone(),
            background: self.background.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: HashMap<ClientId, Player>,
    /// Most recent name seen on each side, kept after the player leaves.
    last_names: SideMap<Option<String>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// First unoccupied side in enumeration order.
    pub fn free_side(&self) -> Option<Side> {
        Side::ALL.into_iter().find(|side| !self.is_occupied(*side))
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Creates the player on the first free side, or updates an existing one
    /// in place. Returns `None` when a new player finds every side taken.
    pub fn join(&mut self, client_id: ClientId, profile: Profile) -> Option<Side> {
        if !self.players.contains_key(&client_id) {
            let side = self.free_side()?;
            self.players.insert(
                client_id,
                Player {
                    side,
                    name: String::new(),
                    color: DEFAULT_COLOR.to_string(),
                    ability: None,
                    gradient: None,
                    background: None,
                },
            );
            info!("Client {} took side {:?}", client_id, side);
        }

        let player = self.players.get_mut(&client_id)?;
        player.apply(profile);
        self.last_names[player.side] = Some(player.name.clone());
        Some(player.side)
    }

    pub fn remove(&mut self, client_id: ClientId) -> Option<Player> {
        let player = self.players.remove(&client_id)?;
        info!("Client {} released side {:?}", client_id, player.side);
        Some(player)
    }

    pub fn get(&self, client_id: ClientId) -> Option<&Player> {
        self.players.get(&client_id)
    }

    pub fn side_of(&self, client_id: ClientId) -> Option<Side> {
        self.players.get(&client_id).map(|p| p.side)
    }

    pub fn client_on(&self, side: Side) -> Option<ClientId> {
        self.players
            .iter()
            .find(|(_, p)| p.side == side)
            .map(|(id, _)| *id)
    }

    pub fn player_on(&self, side: Side) -> Option<&Player> {
        self.players.values().find(|p| p.side == side)
    }

    pub fn is_occupied(&self, side: Side) -> bool {
        self.player_on(side).is_some()
    }

    pub fn occupancy(&self) -> SideMap<bool> {
        SideMap::from_fn(|side| self.is_occupied(side))
    }

    /// Color of the player on each side, if any.
    pub fn colors(&self) -> SideMap<Option<String>> {
        SideMap::from_fn(|side| self.player_on(side).map(|p| p.color.clone()))
    }

    /// Every player not on `side`, ordered by side.
    pub fn opponents_of(&self, side: Side) -> Vec<(ClientId, Side)> {
        let mut opponents: Vec<(ClientId, Side)> = self
            .players
            .iter()
            .filter(|(_, p)| p.side != side)
            .map(|(id, p)| (*id, p.side))
            .collect();
        opponents.sort_by_key(|(_, s)| *s);
        opponents
    }

    /// Name of the current or most recent player on `side`.
    pub fn known_name(&self, side: Side) -> Option<String> {
        self.player_on(side)
            .map(|p| p.name.clone())
            .filter(|name| !name.is_empty())
            .or_else(|| self.last_names[side].clone())
    }

    /// Sends everyone back to the lobby with blank choices; sides are kept.
    pub fn clear_profiles(&mut self) {
        for player in self.players.values_mut() {
            player.name.clear();
            player.ability = None;
            player.color = DEFAULT_COLOR.to_string();
        }
        self.last_names = SideMap::default();
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn views(&self) -> HashMap<ClientId, PlayerView> {
        self.players
            .iter()
            .map(|(id, player)| (*id, player.view()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
