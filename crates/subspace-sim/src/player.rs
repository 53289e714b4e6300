use std::collections::HashMap;

use subspace_protocol_game::{FlagClaim, FlagDrop, FreqChange, PlayerEntering, PlayerLeaving, PositionUpdate};
use subspace_types::{Frequency, PlayerId, ShipId, StatusFlags, Tick, WeaponData};
use subspace_world::{BrickManager, Map};

use crate::settings::ArenaSettings;

pub const SPECTATOR_SHIP: ShipId = 8;
const WARP_CLAMP_TICKS: i32 = 15;
const JUMP_THRESHOLD: f32 = 4.0;
const LERP_DURATION_MS: f32 = 200.0;

#[derive(Debug, Clone, Copy)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub const ZERO: Vec2f = Vec2f { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vec2f { x, y }
    }

    pub fn get(self, axis: usize) -> f32 {
        if axis == 0 {
            self.x
        } else {
            self.y
        }
    }

    pub fn set(&mut self, axis: usize, v: f32) {
        if axis == 0 {
            self.x = v;
        } else {
            self.y = v;
        }
    }

    pub fn pixel_rounded(self) -> Vec2f {
        Vec2f::new((self.x * 16.0).round() / 16.0, (self.y * 16.0).round() / 16.0)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl std::ops::Sub for Vec2f {
    type Output = Vec2f;
    fn sub(self, rhs: Vec2f) -> Vec2f {
        Vec2f::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    pub squad: String,
    pub flag_points: i32,
    pub kill_points: i32,
    pub id: PlayerId,
    pub frequency: Frequency,
    pub position: Vec2f,
    pub velocity: Vec2f,
    pub lerp_velocity: Vec2f,
    pub lerp_time: f32,
    pub wins: u16,
    pub losses: u16,
    pub bounty: u16,
    pub energy: u16,
    pub ship: ShipId,
    pub direction: u8,
    pub togglables: StatusFlags,
    pub ping: u8,
    pub attach_parent: u16,
    pub flags: u16,
    pub timestamp: u16,
    pub koth: u8,
    pub weapon: WeaponData,
    pub last_bounce_tick: Tick,
}

impl Player {
    fn new(id: PlayerId) -> Self {
        Player {
            name: String::new(),
            squad: String::new(),
            flag_points: 0,
            kill_points: 0,
            id,
            frequency: 0,
            position: Vec2f::ZERO,
            velocity: Vec2f::ZERO,
            lerp_velocity: Vec2f::ZERO,
            lerp_time: 0.0,
            wins: 0,
            losses: 0,
            bounty: 0,
            energy: 0,
            ship: SPECTATOR_SHIP,
            direction: 0,
            togglables: StatusFlags::default(),
            ping: 0,
            attach_parent: 0xFFFF,
            flags: 0,
            timestamp: 0,
            koth: 0,
            weapon: WeaponData::none(),
            last_bounce_tick: Tick::ZERO,
        }
    }
}

/// A player entered/left, warped in from hiding, or was force-spawned —
/// surfaced so a renderer (outside this core) can trigger the matching
/// animation or sound without the simulation layer depending on either.
#[derive(Debug, Clone, Copy)]
pub enum PlayerEvent {
    Warped(PlayerId),
}

/// Tracks every player in the arena, ingests position/state packets, and
/// runs the local axis-aligned collision simulation used to predict a
/// remote player's position between packets.
pub struct PlayerManager {
    players: Vec<Player>,
    lookup: HashMap<PlayerId, usize>,
    pub self_id: PlayerId,
}

impl PlayerManager {
    pub fn new() -> Self {
        PlayerManager { players: Vec::new(), lookup: HashMap::new(), self_id: 0xFFFF }
    }

    pub fn get_self(&self) -> Option<&Player> {
        self.get_by_id(self.self_id)
    }

    pub fn get_by_id(&self, id: PlayerId) -> Option<&Player> {
        self.lookup.get(&id).map(|&i| &self.players[i])
    }

    pub fn get_by_id_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        let idx = *self.lookup.get(&id)?;
        Some(&mut self.players[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Any `PlayerId` (self-id) packet resets the whole table, matching
    /// the original's arena-(re)entry semantics.
    pub fn reset(&mut self, self_id: PlayerId) {
        self.players.clear();
        self.lookup.clear();
        self.self_id = self_id;
    }

    pub fn on_player_entering(&mut self, pkt: &PlayerEntering) {
        let mut player = Player::new(pkt.id);
        player.name = pkt.name.clone();
        player.squad = pkt.squad.clone();
        player.kill_points = pkt.kill_points as i32;
        player.flag_points = pkt.flag_points as i32;
        player.frequency = pkt.frequency;
        player.wins = pkt.wins;
        player.losses = pkt.losses;
        player.attach_parent = pkt.attach_parent;
        player.flags = pkt.flags;
        player.koth = pkt.koth;
        player.ship = pkt.ship;

        if let Some(&idx) = self.lookup.get(&pkt.id) {
            self.players[idx] = player;
        } else {
            self.lookup.insert(pkt.id, self.players.len());
            self.players.push(player);
        }
    }

    pub fn on_player_leaving(&mut self, pkt: &PlayerLeaving) {
        if let Some(idx) = self.lookup.remove(&pkt.id) {
            self.players.swap_remove(idx);
            if idx < self.players.len() {
                let moved_id = self.players[idx].id;
                self.lookup.insert(moved_id, idx);
            }
        }
    }

    pub fn on_freq_change(&mut self, pkt: &FreqChange) {
        if let Some(player) = self.get_by_id_mut(pkt.player_id) {
            player.frequency = pkt.frequency;
        }
    }

    pub fn on_flag_claim(&mut self, pkt: &FlagClaim) {
        if let Some(player) = self.get_by_id_mut(pkt.player_id) {
            player.flags += 1;
        }
    }

    pub fn on_flag_drop(&mut self, pkt: &FlagDrop) {
        if let Some(player) = self.get_by_id_mut(pkt.player_id) {
            if player.flags > 0 {
                player.flags -= 1;
            }
        }
    }

    /// Ingests a large-form position packet: applies the ping-smoothing
    /// clamp from the original, then feeds the decoded position into the
    /// catch-up simulation.
    pub fn ingest_large_position(
        &mut self,
        pkt: &PositionUpdate,
        time_diff: i32,
        current_tick: Tick,
        settings: &ArenaSettings,
        map: &Map,
        bricks: Option<&BrickManager>,
    ) -> Option<PlayerEvent> {
        self.ingest_position(pkt, time_diff, current_tick, settings, map, bricks)
    }

    pub fn ingest_small_position(
        &mut self,
        pkt: &PositionUpdate,
        time_diff: i32,
        current_tick: Tick,
        settings: &ArenaSettings,
        map: &Map,
        bricks: Option<&BrickManager>,
    ) -> Option<PlayerEvent> {
        self.ingest_position(pkt, time_diff, current_tick, settings, map, bricks)
    }

    fn ingest_position(
        &mut self,
        pkt: &PositionUpdate,
        time_diff: i32,
        current_tick: Tick,
        settings: &ArenaSettings,
        map: &Map,
        bricks: Option<&BrickManager>,
    ) -> Option<PlayerEvent> {
        let position = Vec2f::new(pkt.x as f32 / 16.0, pkt.y as f32 / 16.0);

        let idx = *self.lookup.get(&pkt.player_id)?;
        let player = &mut self.players[idx];

        player.direction = pkt.direction;
        player.togglables = pkt.togglables;
        player.bounty = pkt.bounty;
        player.weapon = pkt.weapon;

        let warped = player.togglables.contains(StatusFlags::FLASH);

        // Local timestamp from server time, matching `(timestamp - time_diff) & 0xFFFF`.
        player.timestamp = (pkt.timestamp as i32).wrapping_sub(time_diff) as u16;

        let synced_tick = (current_tick.0 & 0xFFFF_0000) | player.timestamp as u32;
        let mut timestamp_diff = current_tick.diff(Tick::new(synced_tick));
        timestamp_diff = timestamp_diff.clamp(-WARP_CLAMP_TICKS, WARP_CLAMP_TICKS);

        player.ping = (pkt.ping as i32 + timestamp_diff).clamp(0, u8::MAX as i32) as u8;

        let event = if (player.position.is_zero() && !position.is_zero()) || warped { Some(PlayerEvent::Warped(pkt.player_id)) } else { None };

        self.on_position_packet(idx, position, settings, map, bricks);

        event
    }

    /// Catches the player up to "now" by re-simulating `ping` ticks from
    /// the newly-reported position, then snaps back to the pre-simulation
    /// position so the caller can lerp towards the projected one (or jumps
    /// straight there if the discrepancy is too large to lerp smoothly).
    fn on_position_packet(&mut self, idx: usize, position: Vec2f, settings: &ArenaSettings, map: &Map, bricks: Option<&BrickManager>) {
        let ship = self.players[idx].ship.min(7) as usize;
        let radius = settings.ships[ship].radius();
        let bounce_factor = if settings.bounce_factor > 0 { 16.0 / settings.bounce_factor as f32 } else { 0.0 };

        let player = &mut self.players[idx];
        let previous_pos = player.position;
        player.position = position;

        let ping = player.ping;
        for _ in 0..ping {
            simulate_axis_inplace(player, 1.0 / 100.0, 0, Some((radius, bounce_factor, map, bricks)), None);
            simulate_axis_inplace(player, 1.0 / 100.0, 1, Some((radius, bounce_factor, map, bricks)), None);
        }

        let projected = player.position;
        player.position = previous_pos;

        let abs_dx = (projected.x - player.position.x).abs();
        let abs_dy = (projected.y - player.position.y).abs();

        if abs_dx >= JUMP_THRESHOLD || abs_dy >= JUMP_THRESHOLD {
            player.position = projected;
            player.lerp_time = 0.0;
        } else {
            player.lerp_time = LERP_DURATION_MS / 1000.0;
            let rounded = player.position.pixel_rounded();
            player.lerp_velocity = Vec2f::new(
                (projected.x - rounded.x) / player.lerp_time,
                (projected.y - rounded.y) / player.lerp_time,
            );
        }
    }

    /// Per-tick axis-aligned collision simulation against `map`, with
    /// bricks taken into account via `bricks`. Used both for local catch-up
    /// simulation and for advancing every other player between updates.
    pub fn simulate_player(&mut self, id: PlayerId, dt: f32, settings: &ArenaSettings, map: &Map, bricks: Option<&BrickManager>, now: Tick) {
        let idx = match self.lookup.get(&id) {
            Some(&i) => i,
            None => return,
        };

        let radius = settings.ships[self.players[idx].ship.min(7) as usize].radius();
        let bounce_factor = if settings.bounce_factor > 0 { 16.0 / settings.bounce_factor as f32 } else { 0.0 };

        let player = &mut self.players[idx];
        let x_bounce = simulate_axis_inplace(player, dt, 0, Some((radius, bounce_factor, map, bricks)), Some(now));
        let y_bounce = simulate_axis_inplace(player, dt, 1, Some((radius, bounce_factor, map, bricks)), Some(now));

        if x_bounce || y_bounce {
            player.last_bounce_tick = now;
        }

        player.lerp_time -= dt;
    }
}

impl Default for PlayerManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared by the bare catch-up simulation (no map, always bounces off
/// nothing) and the full tick simulation (real map + bricks).
fn simulate_axis_inplace(
    player: &mut Player,
    dt: f32,
    axis: usize,
    collision: Option<(f32, f32, &Map, Option<&BrickManager>)>,
    now: Option<Tick>,
) -> bool {
    let axis_flip = if axis == 0 { 1 } else { 0 };
    let previous = player.position.get(axis);

    let delta = player.velocity.get(axis) * dt;
    player.position.set(axis, previous + delta);

    let mut total_delta = delta;
    if player.lerp_time > 0.0 {
        let timestep = dt.min(player.lerp_time);
        let lerp_delta = player.lerp_velocity.get(axis) * timestep;
        player.position.set(axis, player.position.get(axis) + lerp_delta);
        total_delta += lerp_delta;
    }

    let (radius, bounce_factor, map, bricks) = match collision {
        Some(c) => c,
        None => return false,
    };

    let check = if total_delta < 0.0 {
        (player.position.get(axis) - radius) as i32
    } else {
        (player.position.get(axis) + radius) as i32
    };

    if !(0..=1023).contains(&check) {
        apply_bounce(player, axis, axis_flip, previous, bounce_factor, now);
        return true;
    }

    let start = (player.position.get(axis_flip) - radius - 1.0) as i32;
    let end = (player.position.get(axis_flip) + radius + 1.0) as i32;

    let rounded = player.position.pixel_rounded();
    let collider_min = (rounded.x - radius, rounded.y - radius);
    let collider_max = (rounded.x + radius, rounded.y + radius);

    let frequency = player.frequency;
    for other in start..end {
        let (tx, ty) = if axis == 0 { (check, other) } else { (other, check) };
        if tx < 0 || ty < 0 {
            continue;
        }

        if !map.is_solid(tx as u16, ty as u16, frequency, bricks) {
            continue;
        }

        let tile_min = (tx as f32, ty as f32);
        let tile_max = (tx as f32 + 1.0, ty as f32 + 1.0);

        let overlap = collider_max.0 >= tile_min.0
            && collider_min.0 < tile_max.0
            && collider_max.1 >= tile_min.1
            && collider_min.1 < tile_max.1;

        if overlap {
            apply_bounce(player, axis, axis_flip, previous, bounce_factor, now);
            return true;
        }
    }

    false
}

fn apply_bounce(player: &mut Player, axis: usize, axis_flip: usize, previous: f32, mut bounce_factor: f32, now: Option<Tick>) {
    if let Some(now) = now {
        if now.diff(player.last_bounce_tick) < 1 {
            bounce_factor = 1.0;
        }
    }

    player.position.set(axis, previous);
    player.velocity.set(axis, player.velocity.get(axis) * -bounce_factor);
    player.velocity.set(axis_flip, player.velocity.get(axis_flip) * bounce_factor);

    let lv_axis = player.lerp_velocity.get(axis) * -bounce_factor;
    let lv_flip = player.lerp_velocity.get(axis_flip) * bounce_factor;
    player.lerp_velocity.set(axis, lv_axis);
    player.lerp_velocity.set(axis_flip, lv_flip);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entering(id: PlayerId, name: &str) -> PlayerEntering {
        PlayerEntering {
            ship: 1,
            audio: 0,
            name: name.to_string(),
            squad: String::new(),
            kill_points: 0,
            flag_points: 0,
            id,
            frequency: 0,
            wins: 0,
            losses: 0,
            attach_parent: 0xFFFF,
            flags: 0,
            koth: 0,
        }
    }

    #[test]
    fn entering_then_leaving_removes_player() {
        let mut pm = PlayerManager::new();
        pm.on_player_entering(&entering(1, "alice"));
        assert_eq!(pm.len(), 1);

        pm.on_player_leaving(&PlayerLeaving { id: 1 });
        assert!(pm.is_empty());
    }

    #[test]
    fn flag_claim_increments_and_drop_never_underflows() {
        let mut pm = PlayerManager::new();
        pm.on_player_entering(&entering(1, "alice"));

        pm.on_flag_drop(&FlagDrop { player_id: 1 });
        assert_eq!(pm.get_by_id(1).unwrap().flags, 0);

        pm.on_flag_claim(&FlagClaim { flag_id: 0, player_id: 1 });
        pm.on_flag_claim(&FlagClaim { flag_id: 1, player_id: 1 });
        assert_eq!(pm.get_by_id(1).unwrap().flags, 2);

        pm.on_flag_drop(&FlagDrop { player_id: 1 });
        assert_eq!(pm.get_by_id(1).unwrap().flags, 1);
    }

    #[test]
    fn freq_change_updates_player() {
        let mut pm = PlayerManager::new();
        pm.on_player_entering(&entering(1, "alice"));
        pm.on_freq_change(&FreqChange { player_id: 1, frequency: 5 });
        assert_eq!(pm.get_by_id(1).unwrap().frequency, 5);
    }

    #[test]
    fn small_ping_discrepancy_lerps_rather_than_jumps() {
        let mut pm = PlayerManager::new();
        pm.on_player_entering(&entering(1, "alice"));

        let pkt = PositionUpdate {
            player_id: 1,
            direction: 0,
            timestamp: 0,
            x: 160,
            y: 160,
            vel_x: 0,
            vel_y: 0,
            togglables: StatusFlags::default(),
            ping: 0,
            bounty: 0,
            weapon: WeaponData::none(),
            energy: None,
            s2c_latency: None,
            timers: None,
            items: None,
        };

        let settings = ArenaSettings::default();
        let map = Map::empty();
        pm.ingest_large_position(&pkt, 0, Tick::new(0), &settings, &map, None);
        let player = pm.get_by_id(1).unwrap();
        assert_eq!(player.position.x, 10.0);
        assert_eq!(player.lerp_time, LERP_DURATION_MS / 1000.0);
    }
}
