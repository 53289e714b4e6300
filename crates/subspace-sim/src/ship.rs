use subspace_protocol_core::VieRng;
use subspace_types::{PlayerId, ShipCapability, StatusFlags, Tick, WeaponData, WeaponType};
use subspace_world::{BrickManager, Map};

use crate::player::{Player, PlayerManager, Vec2f, SPECTATOR_SHIP};
use crate::settings::{ArenaSettings, ShipSettings};
use crate::weapon::WeaponManager;

/// The classic-Continuum prize table, reconstructed from the order of the
/// positive/negative notification string arrays (`ApplyPrize`'s
/// `kPositiveNotifications`/`kNegativeNotifications`) since the `Prize` enum
/// itself wasn't in the filtered source material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prize {
    Recharge,
    Energy,
    Rotation,
    Stealth,
    Cloak,
    XRadar,
    Warp,
    Guns,
    Bombs,
    BouncingBullets,
    Thruster,
    TopSpeed,
    FullCharge,
    EngineShutdown,
    MultiFire,
    Proximity,
    Super,
    Shields,
    Shrapnel,
    AntiWarp,
    Repel,
    Burst,
    Decoy,
    Thor,
    MultiPrize,
    Brick,
    Rocket,
    Portal,
}

impl Prize {
    pub fn from_index(index: i32) -> Option<Prize> {
        Some(match index {
            1 => Prize::Recharge,
            2 => Prize::Energy,
            3 => Prize::Rotation,
            4 => Prize::Stealth,
            5 => Prize::Cloak,
            6 => Prize::XRadar,
            7 => Prize::Warp,
            8 => Prize::Guns,
            9 => Prize::Bombs,
            10 => Prize::BouncingBullets,
            11 => Prize::Thruster,
            12 => Prize::TopSpeed,
            13 => Prize::FullCharge,
            14 => Prize::EngineShutdown,
            15 => Prize::MultiFire,
            16 => Prize::Proximity,
            17 => Prize::Super,
            18 => Prize::Shields,
            19 => Prize::Shrapnel,
            20 => Prize::AntiWarp,
            21 => Prize::Repel,
            22 => Prize::Burst,
            23 => Prize::Decoy,
            24 => Prize::Thor,
            25 => Prize::MultiPrize,
            26 => Prize::Brick,
            27 => Prize::Rocket,
            28 => Prize::Portal,
            _ => return None,
        })
    }
}

/// Prize indices excluded from the post-hit "revenge prize" roll in
/// [`ShipController::on_weapon_hit`]: warp, full charge, engine shutdown,
/// super, shields, and multiprize would be a strange or game-breaking thing
/// to hand to the player who just got shot.
const REVENGE_EXCLUDED: [i32; 6] = [7, 13, 14, 17, 18, 25];

/// One tick's worth of fire-control input, read by [`ShipController::fire_weapons`].
/// Lives in `subspace-sim` rather than `subspace-client` so tests here don't
/// need to depend back on the client crate for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FireInput {
    pub bullet: bool,
    pub bomb: bool,
    pub mine: bool,
    pub repel: bool,
    pub burst: bool,
    pub thor: bool,
    pub decoy: bool,
    pub brick: bool,
    pub rocket: bool,
    pub portal: bool,
}

/// Result of [`ShipController::on_weapon_hit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Absorbed,
    Died,
}

/// Local "my ship" controller: the full upgrade/inventory/timer record for
/// the locally-controlled player, energy upkeep, gun dispatch, incoming
/// damage, and prize application. Remote players are only ever driven
/// through [`PlayerManager::simulate_player`]; this mirrors the original's
/// split between `ShipController` (local input-driven ship) and the
/// position-packet-driven prediction used for everyone else.
pub struct ShipController {
    pub recharge: u16,
    pub rotation: u16,
    pub thrust: u16,
    pub speed: u16,
    pub guns: u8,
    pub bombs: u8,
    pub shrapnel: u8,
    pub repels: u8,
    pub bursts: u8,
    pub decoys: u8,
    pub thors: u8,
    pub bricks: u8,
    pub rockets: u8,
    pub portals: u8,
    pub capability: ShipCapability,

    pub super_end_tick: Tick,
    pub shield_end_tick: Tick,
    pub rocket_end_tick: Tick,
    pub shutdown_end_tick: Tick,
    pub enter_delay_end: Tick,
    pub portal_location: Option<Vec2f>,

    pub last_bullet_tick: Tick,
    pub last_bomb_tick: Tick,
    pub last_repel_tick: Tick,
    next_brick_id: u16,
}

impl ShipController {
    pub fn new() -> Self {
        ShipController {
            recharge: 0,
            rotation: 0,
            thrust: 0,
            speed: 0,
            guns: 1,
            bombs: 1,
            shrapnel: 0,
            repels: 0,
            bursts: 0,
            decoys: 0,
            thors: 0,
            bricks: 0,
            rockets: 0,
            portals: 0,
            capability: ShipCapability::default(),
            super_end_tick: Tick::ZERO,
            shield_end_tick: Tick::ZERO,
            rocket_end_tick: Tick::ZERO,
            shutdown_end_tick: Tick::ZERO,
            enter_delay_end: Tick::ZERO,
            portal_location: None,
            last_bullet_tick: Tick::ZERO,
            last_bomb_tick: Tick::ZERO,
            last_repel_tick: Tick::ZERO,
            next_brick_id: 0,
        }
    }

    /// True while a death's `EnterDelay` keeps the ship out of play; the
    /// client composition root should skip driving input entirely in this
    /// window, matching the original holding the ship in spectator mode.
    pub fn is_in_enter_delay(&self, now: Tick) -> bool {
        self.enter_delay_end.diff(now) > 0
    }

    /// Applies one tick of energy/status upkeep to `player`, matching the
    /// order the original insists on: afterburner cost, recharge, then each
    /// toggled status's energy drain, auto-dropping any status the player
    /// can no longer afford.
    pub fn update_energy(&mut self, player: &mut Player, settings: &ArenaSettings, dt: f32, afterburners_active: bool, afterburner_cost_per_tick: f32) {
        if player.ship >= SPECTATOR_SHIP {
            return;
        }

        let ship = settings.ships[player.ship as usize];

        let mut energy = player.energy as f32;
        let recharge_rate = ship.initial_recharge as f32 + self.recharge as f32 * (ship.max_recharge.max(1) as f32 / 10.0);

        if afterburners_active {
            energy -= afterburner_cost_per_tick * dt;
        } else {
            energy += (recharge_rate.max(ship.max_energy as f32 / 100.0)) * dt;
        }

        if energy > ship.max_energy as f32 {
            energy = ship.max_energy as f32;
        }
        if energy < 0.0 {
            energy = 0.0;
        }

        player.energy = energy as u16;

        self.drain_status(player, StatusFlags::XRADAR, ship.max_energy as f32 / 200.0, dt);
        self.drain_status(player, StatusFlags::STEALTH, ship.max_energy as f32 / 200.0, dt);
        self.drain_status(player, StatusFlags::CLOAK, ship.max_energy as f32 / 200.0, dt);
        self.drain_status(player, StatusFlags::ANTIWARP, ship.max_energy as f32 / 200.0, dt);
    }

    fn drain_status(&self, player: &mut Player, status: StatusFlags, cost_per_tick: f32, dt: f32) {
        if !player.togglables.contains(status) {
            return;
        }

        let cost = cost_per_tick * dt;
        if (player.energy as f32) > cost {
            player.energy -= cost as u16;
        } else {
            player.togglables.remove(status);
        }
    }

    /// Whether `player`'s tile is the arena's designated safe zone, the
    /// condition the original mirrors into a status bit each tick.
    pub fn on_safe_tile(&self, player: &Player, map: &Map) -> bool {
        map.get_tile_id(player.position.x as u16, player.position.y as u16) == subspace_world::tile::SAFE_TILE_ID
    }

    /// Dispatches every fire-control input for `self_id` against inventory,
    /// energy, and per-weapon fire delays. Bullets/bombs/bursts/thors go
    /// through [`WeaponManager`]; bricks go straight into `bricks` since
    /// they're map-state, not projectiles; portals and rockets are
    /// timer/location bookkeeping this controller owns directly.
    #[allow(clippy::too_many_arguments)]
    pub fn fire_weapons(
        &mut self,
        self_id: PlayerId,
        players: &mut PlayerManager,
        weapons: &mut WeaponManager,
        bricks: &mut BrickManager,
        map: &Map,
        settings: &ArenaSettings,
        now: Tick,
        input: FireInput,
    ) {
        let (ship_id, frequency, direction, position, velocity, energy) = match players.get_by_id(self_id) {
            Some(p) if p.ship < SPECTATOR_SHIP => (p.ship, p.frequency, p.direction, p.position, p.velocity, p.energy),
            _ => return,
        };

        if self.is_in_enter_delay(now) {
            return;
        }

        let ship = settings.ships[ship_id as usize];
        let level = (self.guns.saturating_sub(1) as u16).min(3);
        let bomb_level = (self.bombs.saturating_sub(1) as u16).min(3);

        if (input.bomb || input.mine) && now.diff(self.last_bomb_tick) >= ship.bomb_fire_delay as i32 && self.bombs > 0 {
            let fire_energy = if input.mine { ship.landmine_fire_energy } else { ship.bomb_fire_energy };
            let allowed = energy >= fire_energy && (!input.mine || self.mine_drop_allowed(self_id, frequency, position, ship_id, weapons, settings));

            if allowed {
                let data = WeaponData {
                    kind: WeaponType::Bomb.as_u16(),
                    level: bomb_level,
                    shrap: self.shrapnel as u16,
                    shrap_bouncing: self.capability.contains(ShipCapability::BOUNCING_BULLETS),
                    alternate: input.mine,
                    ..Default::default()
                };

                weapons.fire(
                    self_id,
                    frequency,
                    ship.radius(),
                    direction,
                    data,
                    position,
                    if input.mine { Vec2f::ZERO } else { velocity },
                    now,
                    settings,
                    false,
                    0,
                    0.0,
                    ship.bomb_speed as f32,
                    ship.bomb_bounce_count,
                    0.0,
                    0.0,
                );

                self.last_bomb_tick = now;
                if let Some(player) = players.get_by_id_mut(self_id) {
                    player.energy = player.energy.saturating_sub(fire_energy);
                }
            }
        }

        if input.bullet && now.diff(self.last_bullet_tick) >= ship.bullet_fire_delay as i32 && self.guns > 0 {
            let fire_energy = if self.capability.contains(ShipCapability::MULTIFIRE) { ship.multi_fire_energy } else { ship.bullet_fire_energy };
            if energy >= fire_energy {
                let data = WeaponData {
                    kind: WeaponType::Bullet.as_u16(),
                    level,
                    alternate: self.capability.contains(ShipCapability::MULTIFIRE),
                    ..Default::default()
                };

                weapons.fire(
                    self_id,
                    frequency,
                    ship.radius(),
                    direction,
                    data,
                    position,
                    velocity,
                    now,
                    settings,
                    ship.double_barrel,
                    ship.burst_shrapnel,
                    ship.bullet_speed as f32,
                    ship.bomb_speed as f32,
                    ship.bomb_bounce_count,
                    ship.burst_speed as f32,
                    ship.multi_fire_angle as f32,
                );

                self.last_bullet_tick = now;
                if let Some(player) = players.get_by_id_mut(self_id) {
                    player.energy = player.energy.saturating_sub(fire_energy);
                }
            }
        }

        if input.repel && self.repels > 0 && now.diff(self.last_repel_tick) >= 0 {
            self.repels -= 1;
            self.last_repel_tick = now;
            weapons.fire(
                self_id,
                frequency,
                ship.radius(),
                direction,
                WeaponData { kind: WeaponType::Repel.as_u16(), ..Default::default() },
                position,
                Vec2f::ZERO,
                now,
                settings,
                false,
                0,
                0.0,
                0.0,
                0,
                0.0,
                0.0,
            );
        }

        if input.burst && self.bursts > 0 {
            self.bursts -= 1;
            weapons.fire(
                self_id,
                frequency,
                ship.radius(),
                direction,
                WeaponData { kind: WeaponType::Burst.as_u16(), ..Default::default() },
                position,
                velocity,
                now,
                settings,
                false,
                ship.burst_shrapnel,
                0.0,
                0.0,
                0,
                ship.burst_speed as f32,
                0.0,
            );
        }

        if input.thor && self.thors > 0 {
            self.thors -= 1;
            weapons.fire(
                self_id,
                frequency,
                ship.radius(),
                direction,
                WeaponData { kind: WeaponType::Thor.as_u16(), shrap: self.shrapnel as u16, ..Default::default() },
                position,
                velocity,
                now,
                settings,
                false,
                0,
                0.0,
                ship.bomb_speed as f32 * 2.0,
                0,
                0.0,
                0.0,
            );
        }

        if input.decoy && self.decoys > 0 {
            self.decoys -= 1;
            weapons.fire(
                self_id,
                frequency,
                ship.radius(),
                direction,
                WeaponData { kind: WeaponType::Decoy.as_u16(), ..Default::default() },
                position,
                velocity,
                now,
                settings,
                false,
                0,
                0.0,
                0.0,
                0,
                0.0,
                0.0,
            );
        }

        if input.brick && self.bricks > 0 {
            self.bricks -= 1;
            self.next_brick_id = self.next_brick_id.wrapping_add(1);
            let (hx, hy) = {
                let rads = (direction as f32 / 40.0) * std::f32::consts::TAU;
                (rads.sin(), -rads.cos())
            };
            let start = (position.x, position.y);
            let end = (position.x + hx * 5.0, position.y + hy * 5.0);
            bricks.insert_line(start, end, frequency, self.next_brick_id, settings.brick_time, now);
        }

        if input.rocket && self.rockets > 0 {
            self.rockets -= 1;
            self.rocket_end_tick = now.advance(ship.rocket_time);
        }

        if input.portal {
            match self.portal_location.take() {
                Some(_) if self.portals == 0 => {}
                Some(location) => {
                    if let Some(player) = players.get_by_id_mut(self_id) {
                        player.position = location;
                        player.velocity = Vec2f::ZERO;
                    }
                }
                None => {
                    self.portal_location = Some(position);
                }
            }
        }

        let _ = map;
    }

    /// Whether a mine drop is legal right now: bomb safety forbids dropping
    /// within the arena's proximity radius of another live mine, and the
    /// per-ship/per-team mine caps forbid dropping past the settings limit.
    fn mine_drop_allowed(&self, self_id: PlayerId, frequency: subspace_types::Frequency, position: Vec2f, ship_id: subspace_types::ShipId, weapons: &WeaponManager, settings: &ArenaSettings) -> bool {
        let ship = settings.ships[ship_id.min(7) as usize];

        let own_mines = weapons.iter().filter(|w| w.player_id == self_id && w.data.is_mine()).count() as u8;
        if own_mines >= ship.max_mines {
            return false;
        }

        let team_mines = weapons.iter().filter(|w| w.frequency == frequency && w.data.is_mine()).count() as u32;
        if settings.team_max_mines > 0 && team_mines >= settings.team_max_mines {
            return false;
        }

        if settings.bomb_safety {
            let safety_radius = settings.proximity_distance as f32 / 16.0;
            for other in weapons.iter() {
                if !other.data.is_mine() || other.frequency != frequency {
                    continue;
                }
                let dx = other.position.x - position.x;
                let dy = other.position.y - position.y;
                if dx * dx + dy * dy < safety_radius * safety_radius {
                    return false;
                }
            }
        }

        true
    }

    /// Applies the damage from a weapon overlapping this (local) ship,
    /// returning whether the ship died. Mirrors the original's
    /// `OnWeaponHit`: safe-tile early-out, shield-time-proportional
    /// reduction, non-exact-damage randomization, then either a lethal
    /// `Death` (clamping to 1 energy instead for a self-inflicted bomb
    /// splash) or a damage-proportional chance of a "revenge" negative
    /// prize.
    #[allow(clippy::too_many_arguments)]
    pub fn on_weapon_hit(&mut self, player: &mut Player, weapon_type: WeaponType, weapon_level: u16, settings: &ArenaSettings, now: Tick, map: &Map, rng: &mut VieRng, is_self_bomb_splash: bool) -> HitOutcome {
        if map.get_tile_id(player.position.x as u16, player.position.y as u16) == subspace_world::tile::SAFE_TILE_ID {
            return HitOutcome::Absorbed;
        }

        let ship: ShipSettings = settings.ships.get(player.ship.min(7) as usize).copied().unwrap_or_default();

        let base = match weapon_type {
            WeaponType::Bullet | WeaponType::BouncingBullet => ship.bullet_damage_level as u32 * (weapon_level as u32 + 1),
            WeaponType::Bomb | WeaponType::ProximityBomb => ship.bomb_damage_level as u32 * (weapon_level as u32 + 1),
            WeaponType::Thor => ship.bomb_damage_level as u32 * (weapon_level as u32 + 1) * 2,
            WeaponType::Burst => ship.burst_damage_level as u32,
            _ => 0,
        };

        let mut damage = base;

        if self.shield_end_tick.diff(now) > 0 {
            let remaining = self.shield_end_tick.diff(now).max(0) as f32;
            let scale = 1.0 - (remaining / ship.max_shield_time.max(1) as f32).min(1.0);
            damage = (damage as f32 * scale) as u32;
        }

        if !settings.exact_damage && damage > 0 {
            let span = damage.saturating_mul(damage) / 1000 + 1;
            let roll = rng.next() % span;
            damage = (roll as f32).sqrt() as u32;
        }

        damage /= 1000;

        if is_self_bomb_splash {
            damage = damage.min(player.energy.saturating_sub(1) as u32);
        }

        if (player.energy as u32) < damage {
            player.energy = 0;
            self.enter_delay_end = now.advance(settings.enter_delay);
            return HitOutcome::Died;
        }

        player.energy -= damage as u16;

        if !settings.exact_damage && ship.max_energy > 0 {
            let revenge_chance = (damage as f32 / ship.max_energy as f32) * 0.1;
            let roll = rng.next() as f32 / u32::MAX as f32;
            if roll < revenge_chance {
                let picked = generate_prize(rng, settings);
                if !REVENGE_EXCLUDED.contains(&picked) {
                    self.apply_prize(player, -picked, settings, rng, now);
                }
            }
        }

        HitOutcome::Absorbed
    }

    /// Applies a collected prize, including `Prize::None`'s weighted-random
    /// draw and `Prize::MultiPrize`'s multi-draw expansion (both recursive
    /// through [`generate_prize`]). Capability-only prizes (stealth, cloak,
    /// x-radar, antiwarp, multifire, proximity, bouncing bullets) flip a
    /// [`ShipCapability`] bit rather than an active [`StatusFlags`] bit:
    /// the player's own input still decides whether a granted capability is
    /// actually in use. Counters disabled in this arena (`max == 0`)
    /// redirect to a full-charge grant instead of silently no-opping.
    pub fn apply_prize(&mut self, player: &mut Player, prize_id: i32, settings: &ArenaSettings, rng: &mut VieRng, now: Tick) {
        let negative = prize_id < 0;
        let index = prize_id.unsigned_abs() as i32;

        if index == 0 {
            let generated = generate_prize(rng, settings);
            self.apply_prize(player, if negative { -generated } else { generated }, settings, rng, now);
            return;
        }

        let prize = match Prize::from_index(index) {
            Some(p) => p,
            None => {
                if !negative {
                    player.bounty += 1;
                }
                return;
            }
        };

        if !negative {
            player.bounty += 1;
        }

        let ship: ShipSettings = settings.ships.get(player.ship.min(7) as usize).copied().unwrap_or_default();

        match prize {
            Prize::Recharge => step_or_full_charge(&mut self.recharge, ship.max_recharge, negative, player, &ship),
            Prize::Energy => {
                if negative {
                    player.energy = player.energy.saturating_sub(ship.max_energy / 4);
                } else {
                    player.energy = (player.energy + ship.max_energy / 8).min(ship.max_energy);
                }
            }
            Prize::Rotation => step_or_full_charge(&mut self.rotation, ship.max_rotation, negative, player, &ship),
            Prize::Stealth => toggle_capability(&mut self.capability, ShipCapability::STEALTH, negative),
            Prize::Cloak => toggle_capability(&mut self.capability, ShipCapability::CLOAK, negative),
            Prize::XRadar => toggle_capability(&mut self.capability, ShipCapability::XRADAR, negative),
            Prize::Warp => {}
            Prize::Guns => {
                let mut level = self.guns as u16;
                step_or_full_charge(&mut level, ship.max_guns as u16, negative, player, &ship);
                self.guns = level as u8;
            }
            Prize::Bombs => {
                let mut level = self.bombs as u16;
                step_or_full_charge(&mut level, ship.max_bombs as u16, negative, player, &ship);
                self.bombs = level as u8;
            }
            Prize::BouncingBullets => toggle_capability(&mut self.capability, ShipCapability::BOUNCING_BULLETS, negative),
            Prize::Thruster => step_or_full_charge(&mut self.thrust, ship.max_thrust, negative, player, &ship),
            Prize::TopSpeed => step_or_full_charge(&mut self.speed, ship.max_speed, negative, player, &ship),
            Prize::FullCharge => {
                if !negative {
                    grant_full_charge(player, &ship);
                }
            }
            Prize::EngineShutdown => {
                if !negative {
                    player.velocity = Vec2f::ZERO;
                    self.shutdown_end_tick = now.advance(300);
                }
            }
            Prize::MultiFire => toggle_capability(&mut self.capability, ShipCapability::MULTIFIRE, negative),
            Prize::Proximity => toggle_capability(&mut self.capability, ShipCapability::PROXIMITY, negative),
            Prize::Super => {
                if !negative {
                    self.super_end_tick = now.advance(3000);
                }
            }
            Prize::Shields => {
                if !negative {
                    self.shield_end_tick = now.advance(ship.max_shield_time);
                }
            }
            Prize::Shrapnel => {
                let mut level = self.shrapnel as u16;
                step_or_full_charge(&mut level, ship.max_shrapnel as u16, negative, player, &ship);
                self.shrapnel = level as u8;
            }
            Prize::AntiWarp => toggle_capability(&mut self.capability, ShipCapability::ANTIWARP, negative),
            Prize::Repel => {
                let mut level = self.repels as u16;
                step_or_full_charge(&mut level, ship.max_repel as u16, negative, player, &ship);
                self.repels = level as u8;
            }
            Prize::Burst => {
                let mut level = self.bursts as u16;
                step_or_full_charge(&mut level, ship.max_burst as u16, negative, player, &ship);
                self.bursts = level as u8;
            }
            Prize::Decoy => {
                let mut level = self.decoys as u16;
                step_or_full_charge(&mut level, ship.max_decoy as u16, negative, player, &ship);
                self.decoys = level as u8;
            }
            Prize::Thor => {
                let mut level = self.thors as u16;
                step_or_full_charge(&mut level, ship.max_thor as u16, negative, player, &ship);
                self.thors = level as u8;
            }
            Prize::MultiPrize => {
                for _ in 0..3 {
                    let generated = generate_prize(rng, settings);
                    self.apply_prize(player, if negative { -generated } else { generated }, settings, rng, now);
                }
            }
            Prize::Brick => {
                let mut level = self.bricks as u16;
                step_or_full_charge(&mut level, ship.max_brick as u16, negative, player, &ship);
                self.bricks = level as u8;
            }
            Prize::Rocket => {
                let mut level = self.rockets as u16;
                step_or_full_charge(&mut level, ship.max_rocket as u16, negative, player, &ship);
                self.rockets = level as u8;
            }
            Prize::Portal => {
                let mut level = self.portals as u16;
                step_or_full_charge(&mut level, ship.max_portal as u16, negative, player, &ship);
                self.portals = level as u8;
            }
        }
    }
}

impl Default for ShipController {
    fn default() -> Self {
        Self::new()
    }
}

fn toggle_capability(capability: &mut ShipCapability, bit: ShipCapability, negative: bool) {
    if negative {
        capability.remove(bit);
    } else {
        capability.insert(bit);
    }
}

/// Classic-Continuum upgrade/downgrade clamp: increments on a positive
/// prize up to `max`, decrements on a negative one down to zero. When the
/// counter is arena-disabled (`max == 0`) a positive prize redirects to a
/// full-charge grant instead of silently doing nothing.
fn step_or_full_charge(value: &mut u16, max: u16, negative: bool, player: &mut Player, ship: &ShipSettings) {
    if max == 0 {
        if !negative {
            grant_full_charge(player, ship);
        }
        return;
    }

    if negative {
        *value = value.saturating_sub(1);
    } else {
        *value = (*value + 1).min(max);
    }
}

fn grant_full_charge(player: &mut Player, ship: &ShipSettings) {
    player.energy = ship.max_energy;
}

/// Weighted-random positive prize index (1..=28), used by `Prize::None`'s
/// roll and `Prize::MultiPrize`'s expansion. Falls back to `Recharge` if
/// every weight is zero rather than panicking on an empty arena config.
pub fn generate_prize(rng: &mut VieRng, settings: &ArenaSettings) -> i32 {
    let total: u32 = settings.prize_weights.iter().map(|&w| w as u32).sum();
    if total == 0 {
        return 1;
    }

    let mut roll = rng.next() % total;
    for (i, &weight) in settings.prize_weights.iter().enumerate() {
        if roll < weight as u32 {
            return (i + 1) as i32;
        }
        roll -= weight as u32;
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use subspace_protocol_game::PlayerEntering;

    fn make_players() -> PlayerManager {
        let mut pm = PlayerManager::new();
        pm.on_player_entering(&PlayerEntering {
            ship: 0,
            audio: 0,
            name: "alice".into(),
            squad: String::new(),
            kill_points: 0,
            flag_points: 0,
            id: 1,
            frequency: 0,
            wins: 0,
            losses: 0,
            attach_parent: 0xFFFF,
            flags: 0,
            koth: 0,
        });
        pm.self_id = 1;
        pm
    }

    #[test]
    fn full_charge_prize_maxes_energy() {
        let mut controller = ShipController::new();
        let mut settings = ArenaSettings::default();
        settings.ships[0].max_energy = 1000;
        let mut pm = make_players();
        let mut rng = VieRng::new(1);
        let player = pm.get_by_id_mut(1).unwrap();
        controller.apply_prize(player, Prize::FullCharge as i32 + 1, &settings, &mut rng, Tick::ZERO);
        assert_eq!(player.energy, 1000);
    }

    #[test]
    fn multifire_prize_grants_capability() {
        let mut controller = ShipController::new();
        let settings = ArenaSettings::default();
        let mut pm = make_players();
        let mut rng = VieRng::new(1);
        let player = pm.get_by_id_mut(1).unwrap();
        controller.apply_prize(player, 15, &settings, &mut rng, Tick::ZERO);
        assert!(controller.capability.contains(ShipCapability::MULTIFIRE));
        controller.apply_prize(player, -15, &settings, &mut rng, Tick::ZERO);
        assert!(!controller.capability.contains(ShipCapability::MULTIFIRE));
    }

    #[test]
    fn disabled_upgrade_redirects_to_full_charge() {
        let mut controller = ShipController::new();
        let mut settings = ArenaSettings::default();
        settings.ships[0].max_recharge = 0;
        settings.ships[0].max_energy = 777;
        let mut pm = make_players();
        let mut rng = VieRng::new(1);
        let player = pm.get_by_id_mut(1).unwrap();
        controller.apply_prize(player, 1, &settings, &mut rng, Tick::ZERO);
        assert_eq!(player.energy, 777);
        assert_eq!(controller.recharge, 0);
    }

    #[test]
    fn fire_weapons_respects_delay() {
        let mut controller = ShipController::new();
        let mut settings = ArenaSettings::default();
        settings.ships[0].bullet_fire_energy = 0;
        let mut pm = make_players();
        let mut weapons = WeaponManager::new();
        let mut bricks = BrickManager::new();
        let map = Map::empty();

        controller.fire_weapons(1, &mut pm, &mut weapons, &mut bricks, &map, &settings, Tick::new(0), FireInput { bullet: true, ..Default::default() });
        assert_eq!(weapons.len(), 1);

        controller.fire_weapons(1, &mut pm, &mut weapons, &mut bricks, &map, &settings, Tick::new(1), FireInput { bullet: true, ..Default::default() });
        assert_eq!(weapons.len(), 1);

        settings.ships[0].bullet_fire_delay = 5;
        controller.fire_weapons(1, &mut pm, &mut weapons, &mut bricks, &map, &settings, Tick::new(20), FireInput { bullet: true, ..Default::default() });
        assert_eq!(weapons.len(), 2);
    }

    #[test]
    fn mine_overlap_is_refused_past_the_per_ship_cap() {
        let mut controller = ShipController::new();
        let mut settings = ArenaSettings::default();
        settings.ships[0].max_mines = 1;
        settings.ships[0].bomb_fire_energy = 0;
        settings.ships[0].landmine_fire_energy = 0;
        let mut pm = make_players();
        let mut weapons = WeaponManager::new();
        let mut bricks = BrickManager::new();
        let map = Map::empty();

        controller.fire_weapons(1, &mut pm, &mut weapons, &mut bricks, &map, &settings, Tick::new(0), FireInput { mine: true, ..Default::default() });
        assert_eq!(weapons.len(), 1);

        controller.fire_weapons(1, &mut pm, &mut weapons, &mut bricks, &map, &settings, Tick::new(100), FireInput { mine: true, ..Default::default() });
        assert_eq!(weapons.len(), 1, "second mine refused once the per-ship cap is already laid");
    }

    #[test]
    fn on_weapon_hit_kills_when_energy_runs_out() {
        let mut controller = ShipController::new();
        let mut settings = ArenaSettings::default();
        settings.ships[0].bullet_damage_level = 1000;
        settings.exact_damage = true;
        settings.enter_delay = 500;
        let mut pm = make_players();
        let map = Map::empty();
        let mut rng = VieRng::new(1);
        let player = pm.get_by_id_mut(1).unwrap();
        player.energy = 0;

        let outcome = controller.on_weapon_hit(player, WeaponType::Bullet, 0, &settings, Tick::new(100), &map, &mut rng, false);
        assert_eq!(outcome, HitOutcome::Died);
        assert_eq!(controller.enter_delay_end, Tick::new(600));
    }
}
