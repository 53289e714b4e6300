/// Per-ship tuning the zone server broadcasts in the `ArenaSettings`
/// packet. Field names and roles are reconstructed from their call sites
/// across the simulation (`GetRadius`, `BulletSpeed`, `BombBounceCount`,
/// `MaxMines`, the `null/ShipController.cpp`/`null/WeaponManager.cpp`
/// `FireWeapons`/`ApplyPrize`/`OnWeaponHit` settings reads, ...); the
/// settings struct itself wasn't in the source material, only its usages.
#[derive(Debug, Clone, Copy)]
pub struct ShipSettings {
    pub radius: f32,
    pub max_energy: u16,
    pub initial_energy: u16,
    pub max_speed: u16,
    pub bullet_speed: u16,
    pub bomb_speed: u16,
    pub bomb_bounce_count: u8,
    pub double_barrel: bool,
    pub multi_fire_angle: u16,
    pub burst_speed: u16,
    pub burst_shrapnel: u8,

    pub initial_recharge: u16,
    pub max_recharge: u16,
    pub initial_rotation: u16,
    pub max_rotation: u16,
    pub initial_guns: u8,
    pub max_guns: u8,
    pub initial_bombs: u8,
    pub max_bombs: u8,
    pub initial_thrust: u16,
    pub max_thrust: u16,
    pub max_shrapnel: u8,

    pub max_mines: u8,
    pub max_repel: u8,
    pub max_burst: u8,
    pub max_decoy: u8,
    pub max_thor: u8,
    pub max_brick: u8,
    pub max_rocket: u8,
    pub max_portal: u8,

    pub bullet_fire_energy: u16,
    pub multi_fire_energy: u16,
    pub bomb_fire_energy: u16,
    pub landmine_fire_energy: u16,
    pub bullet_fire_delay: u32,
    pub multi_fire_delay: u32,
    pub bomb_fire_delay: u32,
    pub rocket_time: u32,
    pub turret_speed_penalty: u16,

    pub damage_factor: u16,
    pub bullet_damage_level: u16,
    pub bomb_damage_level: u16,
    pub burst_damage_level: u16,
    pub shrapnel_damage_percent: u16,
    pub inactive_shrap_damage: u16,
    pub max_shield_time: u32,
}

impl Default for ShipSettings {
    fn default() -> Self {
        ShipSettings {
            radius: 0.0,
            max_energy: 0,
            initial_energy: 0,
            max_speed: 0,
            bullet_speed: 0,
            bomb_speed: 0,
            bomb_bounce_count: 0,
            double_barrel: false,
            multi_fire_angle: 0,
            burst_speed: 0,
            burst_shrapnel: 0,
            initial_recharge: 0,
            max_recharge: 0,
            initial_rotation: 0,
            max_rotation: 0,
            initial_guns: 1,
            max_guns: 6,
            initial_bombs: 1,
            max_bombs: 6,
            initial_thrust: 0,
            max_thrust: 0,
            max_shrapnel: 31,
            max_mines: 0,
            max_repel: 0,
            max_burst: 0,
            max_decoy: 0,
            max_thor: 0,
            max_brick: 0,
            max_rocket: 0,
            max_portal: 0,
            bullet_fire_energy: 0,
            multi_fire_energy: 0,
            bomb_fire_energy: 0,
            landmine_fire_energy: 0,
            bullet_fire_delay: 0,
            multi_fire_delay: 0,
            bomb_fire_delay: 0,
            rocket_time: 0,
            turret_speed_penalty: 0,
            damage_factor: 0,
            bullet_damage_level: 200,
            bomb_damage_level: 2000,
            burst_damage_level: 1500,
            shrapnel_damage_percent: 1000,
            inactive_shrap_damage: 500,
            max_shield_time: 300,
        }
    }
}

impl ShipSettings {
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// Arena-wide settings relevant to this core's simulation. A real zone
/// sends hundreds of settings fields (weapon damage tables, prize weights,
/// etc.); only the ones the simulation modules actually read are modeled.
#[derive(Debug, Clone, Copy)]
pub struct ArenaSettings {
    pub received: bool,
    pub door_delay: u32,
    pub door_mode: i32,
    pub bounce_factor: u32,
    pub brick_time: u32,
    pub team_max_mines: u32,
    pub ships: [ShipSettings; 8],

    pub proximity_distance: u16,
    pub bomb_explode_delay: u32,
    pub gravity_bombs: bool,
    pub gravity: i32,
    pub repel_distance: u16,
    pub repel_speed: f32,
    pub exact_damage: bool,
    pub bomb_safety: bool,
    pub enter_delay: u32,
    pub shrapnel_random: bool,

    /// Relative weight of each of the 28 positive prizes, used by
    /// `Prize::None`/`Prize::MultiPrize` expansion (`GeneratePrize`).
    /// Indexed the same way as `Prize::from_index` (index 1 at slot 0).
    pub prize_weights: [u16; 28],
}

impl Default for ArenaSettings {
    fn default() -> Self {
        ArenaSettings {
            received: false,
            door_delay: 0,
            door_mode: 0,
            bounce_factor: 0,
            brick_time: 0,
            team_max_mines: 0,
            ships: [ShipSettings::default(); 8],
            proximity_distance: 0,
            bomb_explode_delay: 0,
            gravity_bombs: false,
            gravity: 0,
            repel_distance: 0,
            repel_speed: 0.0,
            exact_damage: false,
            bomb_safety: false,
            enter_delay: 0,
            shrapnel_random: false,
            prize_weights: [1; 28],
        }
    }
}

impl ArenaSettings {
    pub fn door_settings(&self) -> subspace_world::DoorSettings {
        subspace_world::DoorSettings { received: self.received, door_mode: self.door_mode, door_delay: self.door_delay }
    }
}
