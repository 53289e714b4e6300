use std::io::Read;
use std::path::PathBuf;

use flate2::read::DeflateDecoder;

use subspace_events::{EventBus, GameEvent, GameNotification, NotificationSystem, TextColor};
use subspace_protocol_core::VieRng;
use subspace_protocol_game::{
    Chat, CollectedPrize, CompressedMap, FlagClaim, FlagDrop, FreqChange, GameKind, MapInformation,
    PlayerDeath, PlayerEntering, PlayerLeaving, PositionUpdate, SecurityResponse, SelfPlayerId,
};
use subspace_sim::player::SPECTATOR_SHIP;
use subspace_sim::visibility::{self, RadarIndicator};
use subspace_sim::{
    ArenaSettings, FireInput, HitOutcome, PlayerEvent, PlayerManager, ShipController, Soccer,
    WeaponManager, WeaponOutcome,
};
use subspace_types::{PlayerId, Tick};
use subspace_world::{BrickManager, Map};

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionEvent};
use crate::session::LoginState;

const TICK_DT: f32 = 1.0 / 100.0;
const AFTERBURNER_COST_PER_TICK: f32 = 10.0;

/// Per-tick control state the host (keyboard/gamepad reader) feeds in.
/// This core never reads an input device itself; the bin crate's main loop
/// is the one place that would own that.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShipInput {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub thrust_forward: bool,
    pub thrust_backward: bool,
    pub afterburner: bool,
    pub fire_bullet: bool,
    pub fire_bomb: bool,
    pub fire_mine: bool,
    pub fire_repel: bool,
    pub fire_burst: bool,
    pub fire_thor: bool,
    pub fire_decoy: bool,
    pub fire_brick: bool,
    pub fire_rocket: bool,
    pub fire_portal: bool,
}

impl ShipInput {
    fn into_fire_input(self) -> FireInput {
        FireInput {
            bullet: self.fire_bullet,
            bomb: self.fire_bomb,
            mine: self.fire_mine,
            repel: self.fire_repel,
            burst: self.fire_burst,
            thor: self.fire_thor,
            decoy: self.fire_decoy,
            brick: self.fire_brick,
            rocket: self.fire_rocket,
            portal: self.fire_portal,
        }
    }
}

/// Composition root: owns the connection and every simulation subsystem it
/// feeds, and converts each tick's `ConnectionEvent`s into the matching
/// mutation on `PlayerManager`/`WeaponManager`/`Map`/`Soccer`.
pub struct Game {
    connection: Connection,
    players: PlayerManager,
    weapons: WeaponManager,
    ship: ShipController,
    soccer: Soccer,
    map: Map,
    bricks: BrickManager,
    settings: ArenaSettings,
    events: EventBus,
    notifications: NotificationSystem,
    arena_name: String,
    pending_map_checksum: u32,
    security_response_sent: bool,
}

impl Game {
    pub fn new(config: &ClientConfig, now: Tick, cache_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Ok(Game {
            connection: Connection::new(config, now, cache_root)?,
            players: PlayerManager::new(),
            weapons: WeaponManager::new(),
            ship: ShipController::new(),
            soccer: Soccer::new(),
            map: Map::empty(),
            bricks: BrickManager::new(),
            settings: ArenaSettings::default(),
            events: EventBus::default(),
            notifications: NotificationSystem::new(),
            arena_name: config.arena_name.clone(),
            pending_map_checksum: 0,
            security_response_sent: false,
        })
    }

    pub fn state(&self) -> LoginState {
        self.connection.state()
    }

    pub fn players(&self) -> &PlayerManager {
        &self.players
    }

    pub fn notifications(&self, now: Tick) -> impl Iterator<Item = &GameNotification> {
        self.notifications.visible(now)
    }

    /// The radar/spectate feed for whatever a host renderer wants to draw
    /// this tick: every player visible to the local viewer, classified by
    /// team/bounty/flag status. `spectating` names whichever player a
    /// spectator is currently following, if any.
    pub fn radar(&self, spectating: Option<PlayerId>) -> Vec<RadarIndicator> {
        let viewer_freq = self.players.get_self().map(|p| p.frequency).unwrap_or(0);
        visibility::radar_indicators(&self.players, viewer_freq, spectating)
    }

    /// Drains and returns every game event queued since the last call, so a
    /// host loop can log/render them without reaching into the subsystems
    /// that produced them.
    pub fn drain_events(&mut self) -> Vec<(Tick, GameEvent)> {
        self.events.drain().collect()
    }

    pub fn tick(&mut self, now: Tick, input: ShipInput) {
        let connection_events = self.connection.tick(now);
        let server_now = self.connection.server_tick(now);

        for event in connection_events {
            self.handle_connection_event(event, now, server_now);
        }

        if self.connection.state() != LoginState::Complete {
            return;
        }

        self.try_send_security_response();

        let closed = self.map.update_doors(self.settings.door_settings(), server_now.0);
        for door in closed {
            self.events.push(now, GameEvent::DoorClosed { x: door.x, y: door.y });
        }
        self.bricks.expire(&mut self.map, server_now);

        self.drive_self_ship(server_now, input);

        let others: Vec<PlayerId> = self.players.iter().map(|p| p.id).filter(|&id| id != self.players.self_id).collect();
        for id in others {
            self.players.simulate_player(id, TICK_DT, &self.settings, &self.map, Some(&self.bricks), server_now);
        }

        let bricks = Some(&self.bricks);
        let outcomes = self.weapons.update(server_now, &self.settings, &self.map, bricks, &mut self.players);
        for (weapon, outcome) in outcomes {
            match outcome {
                WeaponOutcome::WallExplosion => self.events.push(now, GameEvent::WeaponWallExplosion { player_id: weapon.player_id }),
                WeaponOutcome::PlayerExplosion(target_id) => {
                    self.events.push(now, GameEvent::WeaponPlayerExplosion { player_id: target_id });
                    if target_id == self.players.self_id {
                        self.apply_weapon_hit(&weapon, server_now, now);
                    }
                }
                WeaponOutcome::LinkRemoved | WeaponOutcome::Continue | WeaponOutcome::TimedOut => {}
            }
        }

        self.soccer.update(&self.map);
    }

    fn handle_connection_event(&mut self, event: ConnectionEvent, now: Tick, server_now: Tick) {
        match event {
            ConnectionEvent::StateChanged(state) => {
                if state == LoginState::GameTimeout || state == LoginState::ConnectTimeout {
                    self.notifications.push(now, TextColor::Red, "connection lost");
                }
            }
            ConnectionEvent::GamePacket(kind_byte, payload) => {
                self.handle_game_packet(kind_byte, &payload, now, server_now);
            }
            ConnectionEvent::FileDownloaded { filename: _, data } => {
                self.load_map(data);
            }
        }
    }

    fn handle_game_packet(&mut self, kind_byte: u8, payload: &[u8], now: Tick, server_now: Tick) {
        match GameKind::from_u8(kind_byte) {
            GameKind::SelfPlayerId => {
                if let Ok(pkt) = SelfPlayerId::decode(payload) {
                    self.players.reset(pkt.id);
                }
            }
            GameKind::PlayerEntering => {
                if let Ok(pkt) = PlayerEntering::decode(payload) {
                    self.events.push(now, GameEvent::PlayerEnteredArena { player_id: pkt.id });
                    self.players.on_player_entering(&pkt);
                }
            }
            GameKind::PlayerLeaving => {
                if let Ok(pkt) = PlayerLeaving::decode(payload) {
                    self.weapons.clear_for_player(pkt.id);
                    self.events.push(now, GameEvent::PlayerLeftArena { player_id: pkt.id });
                    self.players.on_player_leaving(&pkt);
                }
            }
            GameKind::LargePosition => {
                if let Ok(pkt) = PositionUpdate::decode_large(payload) {
                    self.ingest_position(&pkt, true, now, server_now);
                }
            }
            GameKind::SmallPosition => {
                if let Ok(pkt) = PositionUpdate::decode_small(payload) {
                    self.ingest_position(&pkt, false, now, server_now);
                }
            }
            GameKind::Chat => {
                if let Ok(pkt) = Chat::decode(payload) {
                    let sender = self.players.get_by_id(pkt.sender).map(|p| p.name.clone()).unwrap_or_else(|| "?".into());
                    self.notifications.push(now, TextColor::White, format!("{sender}> {}", pkt.message));
                }
            }
            GameKind::FreqChange => {
                if let Ok(pkt) = FreqChange::decode(payload) {
                    self.players.on_freq_change(&pkt);
                }
            }
            GameKind::FlagClaim => {
                if let Ok(pkt) = FlagClaim::decode(payload) {
                    self.players.on_flag_claim(&pkt);
                }
            }
            GameKind::FlagDrop => {
                if let Ok(pkt) = FlagDrop::decode(payload) {
                    self.players.on_flag_drop(&pkt);
                }
            }
            GameKind::MapInformation => {
                if let Ok(info) = MapInformation::decode(payload) {
                    self.pending_map_checksum = info.checksum;
                    match self.connection.request_file(now, &info.filename, &self.arena_name, 0, info.compressed_size, info.checksum, true) {
                        Ok(Some(data)) => self.load_map(data),
                        Ok(None) => {}
                        Err(err) => tracing::warn!(%err, "map file request failed"),
                    }
                }
            }
            GameKind::CompressedMap => {
                if let Ok(pkt) = CompressedMap::decode(payload) {
                    match inflate(&pkt.deflate_bytes) {
                        Ok(data) => self.load_map(data),
                        Err(err) => tracing::warn!(%err, "failed to inflate inline map"),
                    }
                }
            }
            GameKind::CollectedPrize => {
                if let Ok(pkt) = CollectedPrize::decode(payload) {
                    self.apply_collected_prize(pkt.prize_id as i32, pkt.count, server_now);
                }
            }
            GameKind::PlayerDeath => {
                if let Ok(pkt) = PlayerDeath::decode(payload) {
                    self.events.push(now, GameEvent::PlayerDied { killed: pkt.killed, killer: pkt.killer, bounty: pkt.bounty });
                    if pkt.killed == self.players.self_id {
                        self.ship.enter_delay_end = server_now.advance(self.settings.enter_delay);
                    }
                }
            }
            // Security/PasswordResponse/ArenaLogin drive Connection's own
            // state machine and never need a second, game-layer handler.
            _ => {}
        }
    }

    fn ingest_position(&mut self, pkt: &PositionUpdate, large: bool, now: Tick, server_now: Tick) {
        let time_diff = self.connection.time_diff();
        let bricks = Some(&self.bricks);
        let event = if large {
            self.players.ingest_large_position(pkt, time_diff, server_now, &self.settings, &self.map, bricks)
        } else {
            self.players.ingest_small_position(pkt, time_diff, server_now, &self.settings, &self.map, bricks)
        };

        if let Some(PlayerEvent::Warped(player_id)) = event {
            self.events.push(now, GameEvent::PlayerWarped { player_id });
        }
    }

    fn load_map(&mut self, data: Vec<u8>) {
        match Map::from_bytes(&data) {
            Ok(mut map) => {
                let challenge = self.connection.security_challenge();
                map.seed_doors(challenge.door_seed);
                self.bricks.clear();
                self.map = map;
                self.connection.mark_map_loaded(self.pending_map_checksum);
            }
            Err(err) => tracing::warn!(%err, "failed to parse downloaded map"),
        }
    }

    /// Once both the challenge and the exe checksum are ready, answers it.
    /// Held back from the settings/s2c latency histograms the original
    /// tracks: this core doesn't decode arena settings or bucket packet
    /// timing, so those fields go out as zero (documented in DESIGN.md).
    fn try_send_security_response(&mut self) {
        if self.security_response_sent || !self.connection.security_challenge().received {
            return;
        }

        let exe_checksum = match self.connection.exe_checksum() {
            Some(checksum) => checksum,
            None => return,
        };

        let challenge = self.connection.security_challenge();
        let map_checksum = self.map.checksum(challenge.checksum_key);
        let ping = self.connection.ping().clamp(0, u16::MAX as i32) as u16;

        let response = SecurityResponse {
            weapons_received: self.connection.weapons_received(),
            settings_checksum: 0,
            exe_checksum,
            map_checksum,
            s2c_slow_total: 0,
            s2c_fast_total: 0,
            s2c_slow_current: 0,
            s2c_fast_current: 0,
            ping_current: ping,
            ping_average: ping,
            ping_low: ping,
            ping_high: ping,
        };

        self.connection.send_security_response(&response);
        self.security_response_sent = true;
    }

    /// Applies `count` copies of `prize_id` to the local ship. Seeds a
    /// throwaway `VieRng` from the challenge's `prize_seed` rather than
    /// reading/advancing `Connection`'s own copy, so a `Prize::None`/
    /// `MultiPrize` re-roll here never perturbs the seed the original
    /// keeps for the security response.
    fn apply_collected_prize(&mut self, prize_id: i32, count: u16, server_now: Tick) {
        let self_id = self.players.self_id;
        let seed = self.connection.security_challenge().prize_seed;
        let mut rng = VieRng::new(seed);
        let settings = self.settings;
        if let Some(player) = self.players.get_by_id_mut(self_id) {
            for _ in 0..count {
                self.ship.apply_prize(player, prize_id, &settings, &mut rng, server_now);
            }
        }
    }

    /// Runs the damage model for a weapon that just detonated on the local
    /// self player. Bomb/burst/Thor splash against the ship that fired it
    /// clamps to `energy - 1` instead of killing, matching the original's
    /// self-damage exemption.
    fn apply_weapon_hit(&mut self, weapon: &subspace_sim::Weapon, server_now: Tick, now: Tick) {
        let self_id = self.players.self_id;
        let is_self_bomb_splash = weapon.player_id == self_id;
        let seed = self.connection.security_challenge().prize_seed;
        let mut rng = VieRng::new(seed.wrapping_add(server_now.0));
        let settings = self.settings;
        let map = &self.map;

        let outcome = match self.players.get_by_id_mut(self_id) {
            Some(player) => self.ship.on_weapon_hit(
                player,
                weapon.data.weapon_type(),
                weapon.data.level,
                &settings,
                server_now,
                map,
                &mut rng,
                is_self_bomb_splash,
            ),
            None => return,
        };

        if outcome == HitOutcome::Died {
            self.events.push(now, GameEvent::PlayerDied { killed: self_id, killer: weapon.player_id, bounty: 0 });
        }
    }

    fn drive_self_ship(&mut self, server_now: Tick, input: ShipInput) {
        let self_id = self.players.self_id;

        let in_ship = matches!(self.players.get_by_id(self_id), Some(p) if p.ship < SPECTATOR_SHIP);
        if !in_ship || self.ship.is_in_enter_delay(server_now) {
            return;
        }

        if let Some(player) = self.players.get_by_id_mut(self_id) {
            if input.rotate_left {
                player.direction = (player.direction + 39) % 40;
            }
            if input.rotate_right {
                player.direction = (player.direction + 1) % 40;
            }

            if input.thrust_forward || input.thrust_backward {
                let ship = self.settings.ships[player.ship.min(7) as usize];
                let (hx, hy) = heading(player.direction);
                let sign = if input.thrust_forward { 1.0 } else { -1.0 };
                let accel = ship.max_speed as f32 / 100.0;
                player.velocity.x += hx * sign * accel;
                player.velocity.y += hy * sign * accel;

                let speed = (player.velocity.x.powi(2) + player.velocity.y.powi(2)).sqrt();
                let max = ship.max_speed as f32 / 10.0;
                if max > 0.0 && speed > max {
                    let scale = max / speed;
                    player.velocity.x *= scale;
                    player.velocity.y *= scale;
                }
            }
        }

        if let Some(player) = self.players.get_by_id_mut(self_id) {
            self.ship.update_energy(player, &self.settings, TICK_DT, input.afterburner, AFTERBURNER_COST_PER_TICK);
        }

        self.ship.fire_weapons(
            self_id,
            &mut self.players,
            &mut self.weapons,
            &mut self.bricks,
            &self.map,
            &self.settings,
            server_now,
            input.into_fire_input(),
        );

        self.players.simulate_player(self_id, TICK_DT, &self.settings, &self.map, Some(&self.bricks), server_now);
    }
}

/// Matches `subspace_sim::weapon`'s private `orientation_to_heading`: 40
/// discrete facings around the circle, zero pointing up.
fn heading(direction: u8) -> (f32, f32) {
    let rads = (direction as f32 / 40.0) * std::f32::consts::TAU;
    (rads.sin(), -rads.cos())
}

fn inflate(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_zero_points_up() {
        let (x, y) = heading(0);
        assert!(x.abs() < 1e-6);
        assert!(y < 0.0);
    }

    #[test]
    fn heading_is_periodic_across_40_facings() {
        let (x0, y0) = heading(0);
        let (x40, y40) = heading(40 % 40);
        assert_eq!((x0, y0), (x40, y40));
    }
}
