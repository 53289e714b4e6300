use subspace_types::{Frequency, PlayerId, Tick};
use subspace_world::Map;

use crate::player::Vec2f;

pub const INVALID_BALL_ID: u16 = 0xFFFF;
const FIXED_POINT_SCALE: f32 = 16000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallState {
    World,
    Carried,
    Goal,
}

/// A powerball's server-authoritative state, in the original's fixed-point
/// `position * 1000` units (so per-tick integer velocity addition matches
/// the wire format exactly). `as_world_position` converts to tile-space.
#[derive(Debug, Clone, Copy)]
pub struct Powerball {
    pub id: u16,
    pub carrier_id: PlayerId,
    pub frequency: Frequency,
    pub friction_delta: i32,
    pub friction: i32,
    pub x: i64,
    pub y: i64,
    pub vel_x: i32,
    pub vel_y: i32,
    pub timestamp: u32,
    pub state: BallState,
}

impl Powerball {
    fn empty() -> Self {
        Powerball {
            id: INVALID_BALL_ID,
            carrier_id: 0xFFFF,
            frequency: 0,
            friction_delta: 0,
            friction: 0,
            x: 0,
            y: 0,
            vel_x: 0,
            vel_y: 0,
            timestamp: 0,
            state: BallState::World,
        }
    }

    pub fn as_world_position(&self) -> Vec2f {
        Vec2f::new(self.x as f32 / FIXED_POINT_SCALE / 16.0, self.y as f32 / FIXED_POINT_SCALE / 16.0)
    }

    pub fn is_carried(&self) -> bool {
        self.carrier_id != 0xFFFF
    }
}

/// Tracks every powerball in the arena (soccer/powerball zones run up to 8
/// simultaneously) and the ball the local player is currently carrying.
pub struct Soccer {
    pub balls: [Powerball; 8],
    pub carry_id: u16,
}

impl Soccer {
    pub fn new() -> Self {
        Soccer { balls: [Powerball::empty(); 8], carry_id: INVALID_BALL_ID }
    }

    pub fn clear(&mut self) {
        for ball in &mut self.balls {
            *ball = Powerball::empty();
        }
        self.carry_id = INVALID_BALL_ID;
    }

    pub fn is_carrying_ball(&self) -> bool {
        self.carry_id != INVALID_BALL_ID
    }

    /// Ingests a `PowerballPosition` update, fast-forwarding the ball's
    /// simulation by the elapsed ticks since the packet's timestamp (capped
    /// at 6000 ticks, matching the original's runaway-catch-up guard).
    pub fn on_position_update(
        &mut self,
        ball_id: u8,
        x: u16,
        y: u16,
        velocity_x: i16,
        velocity_y: i16,
        owner_id: PlayerId,
        owner_frequency: Option<Frequency>,
        owner_friction_delta: Option<i32>,
        timestamp: u32,
        current_tick: Tick,
        time_diff: i32,
        map: &Map,
    ) {
        if ball_id as usize >= self.balls.len() {
            return;
        }

        {
            let ball = &mut self.balls[ball_id as usize];
            ball.id = ball_id as u16;

            if Tick::new(timestamp).diff(Tick::new(ball.timestamp)) <= 0 && ball.timestamp != 0 {
                return;
            }

            ball.x = x as i64 * 1000;
            ball.y = y as i64 * 1000;
            ball.vel_x = velocity_x as i32;
            ball.vel_y = velocity_y as i32;
        }

        let current_timestamp = current_tick.0.wrapping_add(time_diff as u32);
        let mut sim_ticks = Tick::new(current_timestamp).diff(Tick::new(timestamp));
        if sim_ticks > 6000 {
            sim_ticks = 6000;
        }
        if timestamp == 0 {
            sim_ticks = 0;
        }

        {
            let ball = &mut self.balls[ball_id as usize];
            if owner_id != 0xFFFF {
                if let Some(frequency) = owner_frequency {
                    ball.frequency = frequency;
                    ball.friction_delta = owner_friction_delta.unwrap_or(0);
                    ball.friction = 1_000_000;
                }
            }

            ball.carrier_id = owner_id;
        }

        for _ in 0..sim_ticks.max(0) {
            self.simulate_one(ball_id as usize, map);
        }

        self.balls[ball_id as usize].timestamp = timestamp;
    }

    /// Advances every ball with non-zero friction by one tick: per-axis
    /// wall-bounce simulation, then the friction-decay velocity scale-down.
    pub fn update(&mut self, map: &Map) {
        for id in 0..self.balls.len() {
            if self.balls[id].id == INVALID_BALL_ID {
                continue;
            }
            self.simulate_one(id, map);
        }
    }

    fn simulate_one(&mut self, id: usize, map: &Map) {
        let frequency = self.balls[id].frequency;

        if self.balls[id].friction <= 0 {
            return;
        }

        simulate_axis(&mut self.balls[id].x, &mut self.balls[id].vel_x, self.balls[id].y, map, frequency);
        simulate_axis(&mut self.balls[id].y, &mut self.balls[id].vel_y, self.balls[id].x, map, frequency);

        let friction = self.balls[id].friction / 1000;
        self.balls[id].vel_x = (self.balls[id].vel_x * friction) / 1000;
        self.balls[id].vel_y = (self.balls[id].vel_y * friction) / 1000;

        self.balls[id].friction -= self.balls[id].friction_delta;
    }

    /// True when `position` (in tile units) sits inside the goal region for
    /// `own_frequency`'s team under `mode`'s geometry. Modes 3 and 5 split
    /// the arena into four triangular/quadrant regions keyed on
    /// `frequency % 4`; modes 1/2 are simple half-arena splits.
    pub fn is_team_goal(mode: u8, position: Vec2f, own_frequency: Frequency) -> bool {
        match mode {
            0 => false,
            1 => {
                if own_frequency & 1 != 0 {
                    position.x >= 512.0
                } else {
                    position.x < 512.0
                }
            }
            2 => {
                if own_frequency & 1 != 0 {
                    position.y >= 512.0
                } else {
                    position.y < 512.0
                }
            }
            3 => on_mode_3(position, own_frequency as u32),
            4 => !on_mode_3(position, own_frequency as u32),
            5 => on_mode_5(position, own_frequency as u32),
            6 => !on_mode_5(position, own_frequency as u32),
            _ => true,
        }
    }
}

impl Default for Soccer {
    fn default() -> Self {
        Self::new()
    }
}

fn simulate_axis(pos: &mut i64, vel: &mut i32, other_axis_pos: i64, map: &Map, frequency: Frequency) {
    let previous = *pos;
    *pos += *vel as i64;

    let tile_x = (*pos as f32 / FIXED_POINT_SCALE).floor();
    let tile_y = (other_axis_pos as f32 / FIXED_POINT_SCALE).floor();

    if tile_x < 0.0 || tile_y < 0.0 {
        return;
    }

    if map.is_solid(tile_x as u16, tile_y as u16, frequency, None) {
        *pos = previous;
        *vel = -*vel;
    }
}

fn on_mode_3(position: Vec2f, frequency: u32) -> bool {
    match frequency % 4 {
        0 => position.x < 512.0 && position.y < 512.0,
        1 => position.x >= 512.0 && position.y < 512.0,
        2 => position.x < 512.0 && position.y >= 512.0,
        3 => position.x >= 512.0 && position.y >= 512.0,
        _ => false,
    }
}

fn on_mode_5(position: Vec2f, frequency: u32) -> bool {
    match frequency % 4 {
        0 => {
            if position.y < 512.0 {
                position.x < position.y
            } else {
                position.x + position.y < 1024.0
            }
        }
        1 => {
            if position.x < 512.0 {
                position.x + position.y >= 1024.0
            } else {
                position.x < position.y
            }
        }
        2 => {
            if position.x < 512.0 {
                position.x >= position.y
            } else {
                position.x + position.y < 1024.0
            }
        }
        3 => {
            if position.y <= 512.0 {
                position.x + position.y >= 1024.0
            } else {
                position.x >= position.y
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_all_balls_to_invalid() {
        let mut soccer = Soccer::new();
        soccer.balls[0].id = 0;
        soccer.clear();
        assert_eq!(soccer.balls[0].id, INVALID_BALL_ID);
        assert!(!soccer.is_carrying_ball());
    }

    #[test]
    fn mode_1_splits_arena_in_half_by_frequency_parity() {
        let left = Vec2f::new(100.0, 500.0);
        let right = Vec2f::new(900.0, 500.0);
        assert!(Soccer::is_team_goal(1, left, 0));
        assert!(!Soccer::is_team_goal(1, right, 0));
        assert!(Soccer::is_team_goal(1, right, 1));
    }

    #[test]
    fn position_update_ignores_stale_timestamp() {
        let mut soccer = Soccer::new();
        let map = Map::empty();
        soccer.on_position_update(0, 100, 100, 0, 0, 0xFFFF, None, None, 50, Tick::new(50), 0, &map);
        assert_eq!(soccer.balls[0].timestamp, 50);

        soccer.on_position_update(0, 200, 200, 0, 0, 0xFFFF, None, None, 10, Tick::new(50), 0, &map);
        assert_eq!(soccer.balls[0].x, 100 * 1000);
    }
}
