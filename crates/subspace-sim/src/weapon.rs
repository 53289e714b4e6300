use std::collections::HashSet;

use subspace_buffer::Arena;
use subspace_protocol_core::VieRng;
use subspace_types::{Frequency, PlayerId, Tick, WeaponData, WeaponFlags, WeaponType};
use subspace_world::{tile::AnimatedTile, BrickManager, Map};

use crate::player::{PlayerManager, Vec2f};
use crate::settings::ArenaSettings;

pub const INVALID_LINK: u32 = 0xFFFF_FFFF;
pub const SAFE_TILE_ID: u8 = 171;

/// Microseconds per simulation tick (10 ms), used to derive a monotonic
/// microsecond clock for [`Weapon::last_event_time`] purely from `Tick`
/// values — this core has no internal wall-clock read, so the render
/// extrapolation clock is tied to the same tick counter everything else
/// uses instead of a second time source.
const MICROS_PER_TICK: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponOutcome {
    Continue,
    TimedOut,
    WallExplosion,
    /// A weapon detonated on `PlayerId`. Bullets/bursts only apply real
    /// damage when that id is the local self (see `Game::tick`); bombs and
    /// thors always detonate visually but this core only has authoritative
    /// energy/inventory state for the local ship, so damage is likewise
    /// only applied when the target is self.
    PlayerExplosion(PlayerId),
    /// A sibling of a weapon that just detonated on a player, removed by
    /// link-group propagation with no damage of its own to report.
    LinkRemoved,
}

#[derive(Debug, Clone, Copy)]
pub struct Weapon {
    pub position: Vec2f,
    pub velocity: Vec2f,
    pub end_tick: Tick,
    pub last_tick: Tick,
    pub player_id: PlayerId,
    pub frequency: Frequency,
    pub data: WeaponData,
    pub link_id: u32,
    pub bounces_remaining: u8,
    pub flags: WeaponFlags,
    pub rng_seed: u32,
    pub sensor_end_tick: Tick,
    pub prox_hit_player_id: Option<PlayerId>,
    pub prox_highest_offset: f32,
    pub last_event_position: Vec2f,
    pub last_event_time: u64,
}

impl Weapon {
    /// Where this weapon visually is at `now_micros`, ray-walked forward
    /// from the last tick's authoritative position along its velocity.
    /// Thor ignores walls entirely, matching its no-collision motion.
    pub fn extrapolated_position(&self, now_micros: u64, map: &Map, bricks: Option<&BrickManager>) -> Vec2f {
        let elapsed_s = now_micros.saturating_sub(self.last_event_time) as f32 / 1_000_000.0;

        if self.data.weapon_type() == WeaponType::Thor {
            return Vec2f::new(self.last_event_position.x + self.velocity.x * elapsed_s, self.last_event_position.y + self.velocity.y * elapsed_s);
        }

        let steps = (elapsed_s * 100.0).round().max(0.0) as u32;
        let mut pos = self.last_event_position;
        for _ in 0..steps {
            let nx = pos.x + self.velocity.x / 100.0;
            let ny = pos.y + self.velocity.y / 100.0;
            if map.is_solid(nx.floor().max(0.0) as u16, pos.y.floor().max(0.0) as u16, self.frequency, bricks)
                || map.is_solid(pos.x.floor().max(0.0) as u16, ny.floor().max(0.0) as u16, self.frequency, bricks)
            {
                break;
            }
            pos = Vec2f::new(nx, ny);
        }
        pos
    }
}

/// Every in-flight projectile/effect for the arena, held in a generational
/// arena rather than a plain `Vec` so that per-tick removal (timeout, wall
/// hit, player hit) never shifts a survivor's identity out from under a
/// handle taken earlier in the same pass — the same `PlayerManager ↔
/// WeaponManager` ownership graph the original wires with raw pointers
/// becomes index-based here instead.
#[derive(Default)]
pub struct WeaponManager {
    weapons: Arena<Weapon>,
    next_link_id: u32,
}

impl WeaponManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.values()
    }

    pub fn clear_for_player(&mut self, player_id: PlayerId) {
        let dead: Vec<_> = self.weapons.iter().filter(|(_, w)| w.player_id == player_id).map(|(idx, _)| idx).collect();
        for idx in dead {
            self.weapons.remove(idx);
        }
    }

    /// Dispatches one fired-weapon event into zero or more live weapons,
    /// handling the ship's double-barrel offset and multifire spread for
    /// bullets, and the shrapnel burst for `Burst`.
    #[allow(clippy::too_many_arguments)]
    pub fn fire(
        &mut self,
        player_id: PlayerId,
        frequency: Frequency,
        ship_radius: f32,
        direction: u8,
        weapon: WeaponData,
        position: Vec2f,
        velocity: Vec2f,
        local_timestamp: Tick,
        settings: &ArenaSettings,
        double_barrel: bool,
        burst_shrapnel: u8,
        bullet_speed: f32,
        bomb_speed: f32,
        bomb_bounce_count: u8,
        burst_speed: f32,
        multi_fire_angle_units: f32,
    ) {
        let weapon_type = weapon.weapon_type();
        let heading = orientation_to_heading(direction);

        match weapon_type {
            WeaponType::Bullet | WeaponType::BouncingBullet => {
                let link_id = self.next_link_id;
                self.next_link_id += 1;

                if double_barrel {
                    let perp = Vec2f::new(-heading.y, heading.x);
                    let offset = Vec2f::new(perp.x * ship_radius * 0.75, perp.y * ship_radius * 0.75);
                    self.spawn_bullet(player_id, frequency, weapon, position.x - offset.x, position.y - offset.y, velocity, heading, bullet_speed, local_timestamp, settings, link_id);
                    self.spawn_bullet(player_id, frequency, weapon, position.x + offset.x, position.y + offset.y, velocity, heading, bullet_speed, local_timestamp, settings, link_id);
                } else {
                    self.spawn_bullet(player_id, frequency, weapon, position.x, position.y, velocity, heading, bullet_speed, local_timestamp, settings, link_id);
                }

                if weapon.alternate {
                    let rads = multi_fire_angle_units.to_radians();
                    let first = rotate(heading, rads);
                    let second = rotate(heading, -rads);
                    self.spawn_bullet(player_id, frequency, weapon, position.x, position.y, velocity, first, bullet_speed, local_timestamp, settings, link_id);
                    self.spawn_bullet(player_id, frequency, weapon, position.x, position.y, velocity, second, bullet_speed, local_timestamp, settings, link_id);
                }
            }
            WeaponType::Bomb | WeaponType::ProximityBomb | WeaponType::Thor => {
                let is_mine = weapon.alternate && weapon_type != WeaponType::Thor;
                let (speed, bounces) = if is_mine { (0.0, 0) } else { (bomb_speed, bomb_bounce_count) };
                let v = if is_mine { Vec2f::ZERO } else { Vec2f::new(velocity.x + heading.x * speed, velocity.y + heading.y * speed) };
                let rng_seed = calculate_rng_seed(position, v, weapon.shrap, weapon.level, frequency);
                self.weapons.insert(Weapon {
                    position,
                    velocity: v,
                    end_tick: local_timestamp.advance(alive_ticks(weapon_type, is_mine)),
                    last_tick: local_timestamp,
                    player_id,
                    frequency,
                    data: weapon,
                    link_id: INVALID_LINK,
                    bounces_remaining: bounces,
                    flags: WeaponFlags::default(),
                    rng_seed,
                    sensor_end_tick: Tick::ZERO,
                    prox_hit_player_id: None,
                    prox_highest_offset: f32::MAX,
                    last_event_position: position,
                    last_event_time: local_timestamp.0 as u64 * MICROS_PER_TICK,
                });
            }
            WeaponType::Burst => {
                for i in 0..burst_shrapnel {
                    let orientation = (i as f32 * 40000.0 / burst_shrapnel.max(1) as f32) * 9.0 / 1000.0;
                    let dir = Vec2f::new(orientation.to_radians().sin(), -orientation.to_radians().cos());
                    self.weapons.insert(Weapon {
                        position,
                        velocity: Vec2f::new(dir.x * burst_speed, dir.y * burst_speed),
                        end_tick: local_timestamp.advance(alive_ticks(WeaponType::Burst, false)),
                        last_tick: local_timestamp,
                        player_id,
                        frequency,
                        data: weapon,
                        link_id: INVALID_LINK,
                        bounces_remaining: 0,
                        flags: WeaponFlags::default(),
                        rng_seed: calculate_rng_seed(position, velocity, 0, weapon.level, frequency),
                        sensor_end_tick: Tick::ZERO,
                        prox_hit_player_id: None,
                        prox_highest_offset: f32::MAX,
                        last_event_position: position,
                        last_event_time: local_timestamp.0 as u64 * MICROS_PER_TICK,
                    });
                }
            }
            WeaponType::Repel | WeaponType::Decoy | WeaponType::None => {
                self.weapons.insert(Weapon {
                    position,
                    velocity: Vec2f::ZERO,
                    end_tick: local_timestamp.advance(alive_ticks(weapon_type, false)),
                    last_tick: local_timestamp,
                    player_id,
                    frequency,
                    data: weapon,
                    link_id: INVALID_LINK,
                    bounces_remaining: 0,
                    flags: WeaponFlags::default(),
                    rng_seed: 1,
                    sensor_end_tick: Tick::ZERO,
                    prox_hit_player_id: None,
                    prox_highest_offset: f32::MAX,
                    last_event_position: position,
                    last_event_time: local_timestamp.0 as u64 * MICROS_PER_TICK,
                });
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_bullet(
        &mut self,
        player_id: PlayerId,
        frequency: Frequency,
        data: WeaponData,
        x: f32,
        y: f32,
        velocity: Vec2f,
        heading: Vec2f,
        speed: f32,
        local_timestamp: Tick,
        _settings: &ArenaSettings,
        link_id: u32,
    ) {
        let position = Vec2f::new(x, y);
        let v = Vec2f::new(velocity.x + heading.x * speed, velocity.y + heading.y * speed);
        self.weapons.insert(Weapon {
            position,
            velocity: v,
            end_tick: local_timestamp.advance(alive_ticks(data.weapon_type(), false)),
            last_tick: local_timestamp,
            player_id,
            frequency,
            data,
            link_id,
            bounces_remaining: 0,
            flags: WeaponFlags::default(),
            rng_seed: calculate_rng_seed(position, v, data.shrap, data.level, frequency),
            sensor_end_tick: Tick::ZERO,
            prox_hit_player_id: None,
            prox_highest_offset: f32::MAX,
            last_event_position: position,
            last_event_time: local_timestamp.0 as u64 * MICROS_PER_TICK,
        });
    }

    /// Advances every live weapon to `now`, removing anything that times
    /// out, hits a wall with no bounces left, or hits a player. Weapons
    /// belonging to a player currently standing on a safe tile are pulled
    /// immediately, matching the original's instant-disarm-in-safe rule.
    /// Takes `players` mutably only so a live repel can push the local
    /// self ship; every other read goes through the shared reference.
    pub fn update(&mut self, now: Tick, settings: &ArenaSettings, map: &Map, bricks: Option<&BrickManager>, players: &mut PlayerManager) -> Vec<(Weapon, WeaponOutcome)> {
        let mut removed = Vec::new();
        let indices: Vec<_> = self.weapons.iter().map(|(idx, _)| idx).collect();

        'outer: for idx in indices {
            let mut weapon = match self.weapons.get(idx) {
                Some(w) => *w,
                None => continue,
            };

            if let Some(owner) = players.get_by_id(weapon.player_id) {
                if map.get_tile_id(owner.position.x as u16, owner.position.y as u16) == SAFE_TILE_ID {
                    self.weapons.remove(idx);
                    continue;
                }
            }

            let tick_count = now.diff(weapon.last_tick).max(0);
            for _ in 0..tick_count {
                if weapon.data.weapon_type() == WeaponType::Repel {
                    self.apply_repel(&weapon, players, settings);
                    weapon.last_tick = weapon.last_tick.advance(1);
                    if weapon.last_tick.diff(weapon.end_tick) >= 0 {
                        self.weapons.remove(idx);
                        removed.push((weapon, WeaponOutcome::TimedOut));
                        continue 'outer;
                    }
                    continue;
                }

                let outcome = self.simulate_one(&mut weapon, settings, map, bricks, players);
                if outcome != WeaponOutcome::Continue {
                    self.weapons.remove(idx);
                    removed.push((weapon, outcome));
                    continue 'outer;
                }
            }

            *self.weapons.get_mut(idx).expect("index collected from this arena's own iterator") = weapon;
        }

        self.propagate_link_removals(&mut removed);
        self.spawn_shrapnel(&removed, settings, map, bricks, players);

        removed
    }

    /// When a linked bullet (fired as part of a multifire/double-barrel
    /// group) detonates on a player, every other live sibling with the
    /// same `link_id` detonates too, even though it may not itself overlap
    /// anyone — matching the original's once-per-tick `AddLinkRemoval`.
    fn propagate_link_removals(&mut self, removed: &mut Vec<(Weapon, WeaponOutcome)>) {
        let resolved_links: HashSet<u32> = removed
            .iter()
            .filter(|(w, outcome)| w.link_id != INVALID_LINK && matches!(outcome, WeaponOutcome::PlayerExplosion(_)))
            .map(|(w, _)| w.link_id)
            .collect();

        if resolved_links.is_empty() {
            return;
        }

        let siblings: Vec<_> = self.weapons.iter().filter(|(_, w)| resolved_links.contains(&w.link_id)).map(|(idx, _)| idx).collect();

        for idx in siblings {
            if let Some(weapon) = self.weapons.remove(idx) {
                removed.push((weapon, WeaponOutcome::LinkRemoved));
            }
        }
    }

    /// A radial effect resolved in a single tick: reverses the velocity of
    /// every opposing in-range weapon (away from the repel), converts
    /// opposing mines to live bombs with a freshly-computed alive time, and
    /// pushes the local self ship if it's in range and on another team.
    /// Own-team weapons and other repels are untouched.
    fn apply_repel(&mut self, instigator: &Weapon, players: &mut PlayerManager, settings: &ArenaSettings) {
        let radius = settings.repel_distance as f32 / 16.0;
        let indices: Vec<_> = self.weapons.iter().map(|(idx, _)| idx).collect();

        for idx in indices {
            let target = match self.weapons.get_mut(idx) {
                Some(w) => w,
                None => continue,
            };
            if target.frequency == instigator.frequency || target.data.weapon_type() == WeaponType::Repel {
                continue;
            }

            let dx = target.position.x - instigator.position.x;
            let dy = target.position.y - instigator.position.y;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq > radius * radius {
                continue;
            }

            let dist = dist_sq.sqrt().max(0.001);
            let speed = (target.velocity.x.powi(2) + target.velocity.y.powi(2)).sqrt();
            target.velocity.x = dx / dist * speed;
            target.velocity.y = dy / dist * speed;

            if target.data.is_mine() {
                let mut converted = target.data;
                converted.alternate = false;
                target.data = converted;
                target.end_tick = target.last_tick.advance(alive_ticks(converted.weapon_type(), false));
            }
        }

        let self_id = players.self_id;
        if let Some(self_player) = players.get_by_id_mut(self_id) {
            if self_player.frequency != instigator.frequency {
                let dx = self_player.position.x - instigator.position.x;
                let dy = self_player.position.y - instigator.position.y;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq <= radius * radius {
                    let dist = dist_sq.sqrt().max(0.001);
                    self_player.velocity.x += dx / dist * settings.repel_speed;
                    self_player.velocity.y += dy / dist * settings.repel_speed;
                }
            }
        }
    }

    fn simulate_one(&self, weapon: &mut Weapon, settings: &ArenaSettings, map: &Map, bricks: Option<&BrickManager>, players: &PlayerManager) -> WeaponOutcome {
        weapon.last_tick = weapon.last_tick.advance(1);
        if weapon.last_tick.diff(weapon.end_tick) >= 0 {
            return WeaponOutcome::TimedOut;
        }

        let weapon_type = weapon.data.weapon_type();

        if weapon_type.is_bomb_like() && settings.gravity_bombs {
            apply_wormhole_gravity(weapon, map, settings);
        }

        let collided = simulate_weapon_axis(weapon, 0, map, bricks) | simulate_weapon_axis(weapon, 1, map, bricks);

        if collided {
            if matches!(weapon_type, WeaponType::Bullet | WeaponType::Bomb | WeaponType::ProximityBomb) {
                if weapon.bounces_remaining == 0 {
                    weapon.last_event_position = weapon.position;
                    weapon.last_event_time = weapon.last_tick.0 as u64 * MICROS_PER_TICK;
                    return WeaponOutcome::WallExplosion;
                }
                weapon.bounces_remaining -= 1;
            } else if weapon_type == WeaponType::Burst {
                weapon.flags.insert(WeaponFlags::BURST_ACTIVE);
            }
        }

        weapon.last_event_position = weapon.position;
        weapon.last_event_time = weapon.last_tick.0 as u64 * MICROS_PER_TICK;

        if weapon_type == WeaponType::Decoy {
            return WeaponOutcome::Continue;
        }

        if matches!(weapon_type, WeaponType::ProximityBomb | WeaponType::Thor) {
            if let Some(outcome) = self.check_proximity(weapon, settings, players) {
                return outcome;
            }
        }

        let weapon_radius = if weapon_type.is_bomb_like() { (settings.proximity_distance as f32 + weapon.data.level as f32) / 16.0 } else { 18.0 / 16.0 };

        for player in players.iter() {
            if player.ship == crate::player::SPECTATOR_SHIP {
                continue;
            }
            if player.frequency == weapon.frequency {
                continue;
            }
            if weapon_type == WeaponType::Burst && !weapon.flags.contains(WeaponFlags::BURST_ACTIVE) {
                continue;
            }

            let ship_radius = settings.ships[player.ship.min(7) as usize].radius();
            let overlap = (player.position.x - weapon.position.x).abs() < ship_radius + weapon_radius
                && (player.position.y - weapon.position.y).abs() < ship_radius + weapon_radius;

            if overlap {
                return WeaponOutcome::PlayerExplosion(player.id);
            }
        }

        WeaponOutcome::Continue
    }

    /// Latch-then-detonate proximity/Thor sensor. The first tick a target
    /// enters the wide trigger box, the weapon arms a sensor window and
    /// remembers the target; every later tick tracks how close that same
    /// target is (`prox_highest_offset`, despite the name, is a
    /// monotonically shrinking "closest so far" bound) and detonates the
    /// instant the target starts moving away again, or the sensor window
    /// expires first.
    fn check_proximity(&self, weapon: &mut Weapon, settings: &ArenaSettings, players: &PlayerManager) -> Option<WeaponOutcome> {
        let trigger_radius = (settings.proximity_distance as f32 + weapon.data.level as f32) / 16.0;

        if let Some(target_id) = weapon.prox_hit_player_id {
            let target = players.get_by_id(target_id)?;
            let offset = (target.position.x - weapon.position.x).abs().max((target.position.y - weapon.position.y).abs());

            if offset >= weapon.prox_highest_offset {
                return Some(WeaponOutcome::PlayerExplosion(target_id));
            }
            if weapon.last_tick.diff(weapon.sensor_end_tick) >= 0 {
                return Some(WeaponOutcome::PlayerExplosion(target_id));
            }

            weapon.prox_highest_offset = offset;
            return None;
        }

        for player in players.iter() {
            if player.ship == crate::player::SPECTATOR_SHIP || player.frequency == weapon.frequency {
                continue;
            }

            let offset = (player.position.x - weapon.position.x).abs().max((player.position.y - weapon.position.y).abs());
            if offset <= trigger_radius {
                weapon.prox_hit_player_id = Some(player.id);
                weapon.prox_highest_offset = offset;
                weapon.sensor_end_tick = weapon.last_tick.advance(settings.bomb_explode_delay);
                break;
            }
        }

        None
    }

    /// Spawns the shrapnel burst for every bomb-like weapon that just
    /// detonated (wall or player hit, never a silent timeout), consuming a
    /// `VieRng` seeded from the parent's `rng_seed` so the pattern is
    /// reproducible from the same seed on every peer.
    fn spawn_shrapnel(&mut self, removed: &[(Weapon, WeaponOutcome)], settings: &ArenaSettings, map: &Map, bricks: Option<&BrickManager>, players: &PlayerManager) {
        for (weapon, outcome) in removed {
            if !matches!(outcome, WeaponOutcome::WallExplosion | WeaponOutcome::PlayerExplosion(_)) {
                continue;
            }
            if !weapon.data.weapon_type().is_bomb_like() || weapon.data.shrap == 0 {
                continue;
            }

            let shrap_speed = players
                .get_by_id(weapon.player_id)
                .map(|p| settings.ships[p.ship.min(7) as usize].bullet_speed as f32)
                .unwrap_or(0.0);

            let mut rng = VieRng::new(weapon.rng_seed);
            let count = weapon.data.shrap;

            for i in 0..count {
                let angle_deg = if settings.shrapnel_random { (rng.next() % 360) as f32 } else { i as f32 * 360.0 / count as f32 };
                let rads = angle_deg.to_radians();
                let dir = Vec2f::new(rads.sin(), -rads.cos());

                if map.is_solid(weapon.position.x.floor() as u16, weapon.position.y.floor() as u16, weapon.frequency, bricks) {
                    continue;
                }

                let kind = if weapon.data.shrap_bouncing { WeaponType::BouncingBullet } else { WeaponType::Bullet };
                let data = WeaponData { kind: kind.as_u16(), level: weapon.data.shrap_level, ..Default::default() };

                self.weapons.insert(Weapon {
                    position: weapon.position,
                    velocity: Vec2f::new(dir.x * shrap_speed, dir.y * shrap_speed),
                    end_tick: weapon.last_tick.advance(alive_ticks(kind, false)),
                    last_tick: weapon.last_tick,
                    player_id: weapon.player_id,
                    frequency: weapon.frequency,
                    data,
                    link_id: INVALID_LINK,
                    bounces_remaining: 0,
                    flags: WeaponFlags::default(),
                    rng_seed: calculate_rng_seed(weapon.position, Vec2f::new(dir.x * shrap_speed, dir.y * shrap_speed), 0, data.level, weapon.frequency),
                    sensor_end_tick: Tick::ZERO,
                    prox_hit_player_id: None,
                    prox_highest_offset: f32::MAX,
                    last_event_position: weapon.position,
                    last_event_time: weapon.last_tick.0 as u64 * MICROS_PER_TICK,
                });
            }
        }
    }
}

fn apply_wormhole_gravity(weapon: &mut Weapon, map: &Map, settings: &ArenaSettings) {
    for anchor in &map.animated_tiles(AnimatedTile::Wormhole).tiles {
        let center_x = (anchor.x as f32 + 2.5) * 16.0;
        let center_y = (anchor.y as f32 + 2.5) * 16.0;
        let dx = center_x - weapon.position.x * 16.0;
        let dy = center_y - weapon.position.y * 16.0;
        let dist_sq = dx * dx + dy * dy + 1.0;

        if dist_sq >= (settings.gravity.unsigned_abs() as f32) * 1000.0 {
            continue;
        }

        let thrust = settings.gravity as f32 * 1000.0 / dist_sq;
        let dist = dist_sq.sqrt().max(1.0);
        let impulse = thrust * 10.0 / 16.0 / 100.0;
        weapon.velocity.x += (dx / dist) * impulse;
        weapon.velocity.y += (dy / dist) * impulse;
    }
}

fn simulate_weapon_axis(weapon: &mut Weapon, axis: usize, map: &Map, bricks: Option<&BrickManager>) -> bool {
    if weapon.data.weapon_type() == WeaponType::Thor {
        return false;
    }

    let previous = weapon.position.get(axis);
    weapon.position.set(axis, previous + weapon.velocity.get(axis) / 100.0);

    if map.is_solid(weapon.position.x.floor() as u16, weapon.position.y.floor() as u16, weapon.frequency, bricks) {
        weapon.position.set(axis, previous);
        weapon.velocity.set(axis, -weapon.velocity.get(axis));
        return true;
    }

    false
}

fn orientation_to_heading(direction: u8) -> Vec2f {
    let rads = (direction as f32 / 40.0) * std::f32::consts::TAU;
    Vec2f::new(rads.sin(), -rads.cos())
}

fn rotate(v: Vec2f, rads: f32) -> Vec2f {
    let (s, c) = rads.sin_cos();
    Vec2f::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// Combines a fired weapon's spawn state into the seed used for its
/// shrapnel pattern (bombs) so the same shot produces the same shrapnel on
/// every peer. The original's exact bit-mixing formula isn't in the
/// filtered source, only the inputs it reads (`x1000, y1000, vx, vy,
/// shrap_count, level, frequency`); this is a plausible deterministic
/// combiner over the same inputs.
fn calculate_rng_seed(position: Vec2f, velocity: Vec2f, shrap: u16, level: u16, frequency: Frequency) -> u32 {
    let x1000 = (position.x * 1000.0) as i32 as u32;
    let y1000 = (position.y * 1000.0) as i32 as u32;
    let vx = velocity.x as i32 as u32;
    let vy = velocity.y as i32 as u32;

    let seed = x1000
        .wrapping_mul(0x9E37_79B1)
        .wrapping_add(y1000.wrapping_mul(0x85EB_CA6B))
        .wrapping_add(vx.wrapping_mul(0xC2B2_AE35))
        .wrapping_add(vy.wrapping_mul(0x27D4_EB2F))
        .wrapping_add((shrap as u32).wrapping_mul(31))
        .wrapping_add((level as u32).wrapping_mul(131))
        .wrapping_add(frequency as u32);

    seed.max(1)
}

/// Total ticks a weapon stays alive before timing out, in the absence of
/// the real per-arena weapon-lifetime settings table (not in the source
/// material); uses representative classic-Continuum defaults.
fn alive_ticks(weapon_type: WeaponType, is_mine: bool) -> u32 {
    match weapon_type {
        WeaponType::Bullet | WeaponType::BouncingBullet => 546,
        WeaponType::Bomb | WeaponType::ProximityBomb => {
            if is_mine {
                6000
            } else {
                5461
            }
        }
        WeaponType::Thor => 5461,
        WeaponType::Burst => 546,
        WeaponType::Repel => 1,
        WeaponType::Decoy => 546,
        WeaponType::None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerManager;

    #[test]
    fn bullet_fire_creates_one_weapon() {
        let mut wm = WeaponManager::new();
        let settings = ArenaSettings::default();
        wm.fire(
            1,
            0,
            1.0,
            0,
            WeaponData { kind: WeaponType::Bullet.as_u16(), ..Default::default() },
            Vec2f::ZERO,
            Vec2f::ZERO,
            Tick::new(0),
            &settings,
            false,
            0,
            10.0,
            0.0,
            0,
            0.0,
            0.0,
        );
        assert_eq!(wm.len(), 1);
    }

    #[test]
    fn double_barrel_creates_two_weapons() {
        let mut wm = WeaponManager::new();
        let settings = ArenaSettings::default();
        wm.fire(
            1,
            0,
            1.0,
            0,
            WeaponData { kind: WeaponType::Bullet.as_u16(), ..Default::default() },
            Vec2f::ZERO,
            Vec2f::ZERO,
            Tick::new(0),
            &settings,
            true,
            0,
            10.0,
            0.0,
            0,
            0.0,
            0.0,
        );
        assert_eq!(wm.len(), 2);
    }

    #[test]
    fn weapon_times_out() {
        let mut wm = WeaponManager::new();
        let settings = ArenaSettings::default();
        wm.fire(
            1,
            0,
            1.0,
            0,
            WeaponData { kind: WeaponType::Bullet.as_u16(), ..Default::default() },
            Vec2f::ZERO,
            Vec2f::ZERO,
            Tick::new(0),
            &settings,
            false,
            0,
            0.0,
            0.0,
            0,
            0.0,
            0.0,
        );

        let map = Map::empty();
        let mut players = PlayerManager::new();
        let removed = wm.update(Tick::new(600), &settings, &map, None, &mut players);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].1, WeaponOutcome::TimedOut);
        assert!(wm.is_empty());
    }

    #[test]
    fn repel_reverses_opposing_mine_into_a_bomb() {
        let mut wm = WeaponManager::new();
        let mut settings = ArenaSettings::default();
        settings.repel_distance = 160;
        settings.repel_speed = 10.0;

        wm.fire(
            1,
            0,
            1.0,
            0,
            WeaponData { kind: WeaponType::Bomb.as_u16(), alternate: true, ..Default::default() },
            Vec2f::new(10.0, 10.0),
            Vec2f::ZERO,
            Tick::new(0),
            &settings,
            false,
            0,
            0.0,
            0.0,
            0,
            0.0,
            0.0,
        );
        wm.fire(
            2,
            1,
            1.0,
            0,
            WeaponData { kind: WeaponType::Repel.as_u16(), ..Default::default() },
            Vec2f::new(10.0, 10.0),
            Vec2f::ZERO,
            Tick::new(0),
            &settings,
            false,
            0,
            0.0,
            0.0,
            0,
            0.0,
            0.0,
        );

        let map = Map::empty();
        let mut players = PlayerManager::new();
        wm.update(Tick::new(1), &settings, &map, None, &mut players);

        let bomb = wm.iter().find(|w| w.data.weapon_type() == WeaponType::Bomb).expect("mine converted, bomb survives");
        assert!(!bomb.data.alternate);
    }
}
