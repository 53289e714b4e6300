use subspace_protocol_core::VieRng;
use subspace_types::Vec2;

use crate::brick::BrickManager;
use crate::doors::{derive_mode_minus1_seed, door_table, DoorSettings};
use crate::error::{WorldError, WorldResult};
use crate::geometry::{box_contains_point, ray_box_intersect};
use crate::tile::{
    is_solid_id, AnimatedTile, AnimatedTileSet, RawTile, ANIMATED_TILE_COUNT, BRICK_TILE_ID, FIRST_DOOR_ID,
    LAST_DOOR_ID, OPEN_DOOR_ID, SAFE_TILE_ID,
};

pub const MAP_DIM: u16 = 1024;
const OUT_OF_BOUNDS_TILE: u8 = 20;

#[derive(Debug, Clone, Copy)]
pub struct CastHit {
    pub hit: bool,
    pub distance: f32,
    pub position: Vec2,
    pub normal: Vec2,
}

/// A tile changed from open to closed this reseed, flagged so the caller
/// can check whether to warp anyone out of it.
#[derive(Debug, Clone, Copy)]
pub struct DoorClosed {
    pub x: u16,
    pub y: u16,
}

/// The 1024x1024 tile grid plus door/animated-tile metadata for one arena.
pub struct Map {
    tiles: Vec<u8>,
    doors: Vec<RawTile>,
    animated: [AnimatedTileSet; ANIMATED_TILE_COUNT],
    door_rng: VieRng,
    last_seed_tick: u32,
}

impl Map {
    pub fn empty() -> Self {
        Map {
            tiles: vec![0; MAP_DIM as usize * MAP_DIM as usize],
            doors: Vec::new(),
            animated: Default::default(),
            door_rng: VieRng::new(1),
            last_seed_tick: 0,
        }
    }

    /// Parses a raw `.lvl` file: an optional `BM`-prefixed bitmap preview
    /// followed by a flat table of packed little-endian tile records.
    pub fn from_bytes(data: &[u8]) -> WorldResult<Self> {
        let tile_start = if data.len() >= 6 && data[0] == b'B' && data[1] == b'M' {
            u32::from_le_bytes([data[2], data[3], data[4], data[5]]) as usize
        } else {
            0
        };

        if tile_start > data.len() {
            return Err(WorldError::Truncated);
        }

        let tile_bytes = &data[tile_start..];
        if tile_bytes.len() % 4 != 0 {
            return Err(WorldError::Misaligned);
        }

        let raw_tiles: Vec<RawTile> = tile_bytes
            .chunks_exact(4)
            .map(|c| RawTile::from_u32(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect();

        let mut map = Map::empty();

        for tile in &raw_tiles {
            map.set_tile_id(tile.x, tile.y, tile.id);

            if (FIRST_DOOR_ID..=LAST_DOOR_ID).contains(&tile.id) {
                map.doors.push(*tile);
            }

            for anim in AnimatedTile::ALL {
                if tile.id == anim.tile_id() {
                    let idx = anim.index();
                    map.animated[idx].tiles.push(*tile);

                    let size = anim.footprint() as u16;
                    for j in 0..size {
                        for k in 0..size {
                            map.set_tile_id(tile.x.wrapping_add(k), tile.y.wrapping_add(j), tile.id);
                        }
                    }
                }
            }
        }

        Ok(map)
    }

    pub fn get_tile_id(&self, x: u16, y: u16) -> u8 {
        if x >= MAP_DIM || y >= MAP_DIM {
            return OUT_OF_BOUNDS_TILE;
        }
        self.tiles[y as usize * MAP_DIM as usize + x as usize]
    }

    pub fn set_tile_id(&mut self, x: u16, y: u16, id: u8) {
        if x >= MAP_DIM || y >= MAP_DIM {
            return;
        }
        self.tiles[y as usize * MAP_DIM as usize + x as usize] = id;
    }

    /// Bricks are solid only to the frequency that doesn't own them; that
    /// check is performed by the caller via `brick_manager` since `Map`
    /// doesn't own brick state.
    pub fn is_solid(&self, x: u16, y: u16, frequency: u16, brick_manager: Option<&BrickManager>) -> bool {
        let id = self.get_tile_id(x, y);

        if id == BRICK_TILE_ID {
            if let Some(manager) = brick_manager {
                if let Some(brick) = manager.get(x, y) {
                    return brick.team != frequency;
                }
            }
        }

        is_solid_id(id)
    }

    pub fn animated_tiles(&self, which: AnimatedTile) -> &AnimatedTileSet {
        &self.animated[which.index()]
    }

    pub fn seed_doors(&mut self, seed: u32) -> Vec<DoorClosed> {
        let table = door_table(seed);
        let mut closed = Vec::new();

        for door in &self.doors {
            let new_id = table[(door.id - FIRST_DOOR_ID) as usize];
            let previous_id = self.get_tile_id(door.x, door.y);
            self.tiles[door.y as usize * MAP_DIM as usize + door.x as usize] = new_id;

            if previous_id == OPEN_DOOR_ID && new_id != OPEN_DOOR_ID {
                closed.push(DoorClosed { x: door.x, y: door.y });
            }
        }

        closed
    }

    /// Advances the door reseed clock by `current_tick - last_seed_tick`
    /// (scaled by `DoorDelay`) resend intervals, applying one reseed per
    /// elapsed interval. Returns every door that closed across all of them.
    pub fn update_doors(&mut self, settings: DoorSettings, current_tick: u32) -> Vec<DoorClosed> {
        if !settings.received {
            return Vec::new();
        }

        let mut count = current_tick.wrapping_sub(self.last_seed_tick) as i32;
        if settings.door_delay > 0 {
            count /= settings.door_delay as i32;
        }

        let mut closed = Vec::new();

        for _ in 0..count.max(0) {
            let seed = if settings.door_mode == -2 {
                self.door_rng.next() as u8
            } else if settings.door_mode == -1 {
                derive_mode_minus1_seed(&mut self.door_rng)
            } else if settings.door_mode >= 0 {
                settings.door_mode as u8
            } else {
                self.door_rng.next() as u8
            };

            closed.extend(self.seed_doors(seed as u32));
            self.last_seed_tick = current_tick;
        }

        closed
    }

    pub fn can_fit(&self, position: Vec2, radius: f32, frequency: u16, bricks: Option<&BrickManager>) -> bool {
        let mut y_off = -radius;
        while y_off < radius {
            let mut x_off = -radius;
            while x_off < radius {
                if self.is_solid((position.x + x_off) as u16, (position.y + y_off) as u16, frequency, bricks) {
                    return false;
                }
                x_off += 1.0;
            }
            y_off += 1.0;
        }
        true
    }

    pub fn is_colliding(&self, position: Vec2, radius: f32, frequency: u16, bricks: Option<&BrickManager>) -> bool {
        let mut start_x = (position.x - radius - 1.0) as i32;
        let mut start_y = (position.y - radius - 1.0) as i32;
        let mut end_x = (position.x + radius + 1.0) as i32;
        let mut end_y = (position.y + radius + 1.0) as i32;

        start_x = start_x.max(0);
        start_y = start_y.max(0);
        end_x = end_x.min(1023);
        end_y = end_y.min(1023);

        for y in start_y..=end_y {
            for x in start_x..=end_x {
                if !self.is_solid(x as u16, y as u16, frequency, bricks) {
                    continue;
                }

                let tile_min = Vec2::new(x as f32, y as f32);
                let grown_min = Vec2::new(tile_min.x - radius, tile_min.y - radius);
                let grown_max = Vec2::new(tile_min.x + 1.0 + radius, tile_min.y + 1.0 + radius);

                if box_contains_point(grown_min, grown_max, position) {
                    return true;
                }
            }
        }

        false
    }

    pub fn checksum(&self, key: u32) -> u32 {
        const TILE_START: u8 = 1;
        const TILE_END: u8 = 160;

        let basekey = key;
        let mut key = key;

        let mut y = (basekey % 32) as i32;
        while y < 1024 {
            let mut x = (basekey % 31) as i32;
            while x < 1024 {
                let mut tile = self.get_tile_id(x as u16, y as u16);
                if tile == BRICK_TILE_ID {
                    tile = 0;
                }

                if (tile >= TILE_START && tile <= TILE_END) || tile == SAFE_TILE_ID {
                    key = key.wrapping_add(basekey ^ tile as u32);
                }

                x += 31;
            }
            y += 32;
        }

        key
    }

    /// DDA ray march to the first solid tile along `direction`, reporting
    /// exact hit position/normal via a box intersection against that tile.
    pub fn cast(&self, from: Vec2, direction: Vec2, max_distance: f32, frequency: u16, bricks: Option<&BrickManager>) -> CastHit {
        let unit_step = Vec2::new(
            (1.0 + (direction.y / direction.x).powi(2)).sqrt(),
            (1.0 + (direction.x / direction.y).powi(2)).sqrt(),
        );

        let mut check = Vec2::new(from.x.floor(), from.y.floor());
        let mut travel = Vec2::ZERO;
        let mut step = Vec2::ZERO;

        if direction.x < 0.0 {
            step.x = -1.0;
            travel.x = (from.x - check.x) * unit_step.x;
        } else {
            step.x = 1.0;
            travel.x = (check.x + 1.0 - from.x) * unit_step.x;
        }

        if direction.y < 0.0 {
            step.y = -1.0;
            travel.y = (from.y - check.y) * unit_step.y;
        } else {
            step.y = 1.0;
            travel.y = (check.y + 1.0 - from.y) * unit_step.y;
        }

        let mut distance = 0.0f32;
        let mut hit = false;
        let mut clear_distance = 0.0f32;

        while distance < max_distance {
            clear_distance = distance;

            if travel.x < travel.y {
                check.x += step.x;
                distance = travel.x;
                travel.x += unit_step.x;
            } else {
                check.y += step.y;
                distance = travel.y;
                travel.y += unit_step.y;
            }

            if self.is_solid(check.x.floor() as u16, check.y.floor() as u16, frequency, bricks) {
                hit = true;
                break;
            }
        }

        if hit {
            if let Some((dist, normal)) = ray_box_intersect(from, direction, check, Vec2::new(1.0, 1.0)) {
                if dist <= max_distance {
                    return CastHit { hit: true, distance: dist, position: from + direction * dist, normal };
                }
            }
            let _ = clear_distance;
        }

        CastHit { hit: false, distance: max_distance, position: from + direction * max_distance, normal: Vec2::ZERO }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(x: u16, y: u16, id: u8) -> u32 {
        (x as u32 & 0xFFF) | ((y as u32 & 0xFFF) << 12) | ((id as u32) << 24)
    }

    #[test]
    fn parses_unprefixed_tile_table() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&packed(10, 20, 1).to_le_bytes());
        bytes.extend_from_slice(&packed(500, 500, 172).to_le_bytes());

        let map = Map::from_bytes(&bytes).unwrap();
        assert_eq!(map.get_tile_id(10, 20), 1);
        assert_eq!(map.get_tile_id(500, 500), 172);
        assert_eq!(map.animated_tiles(AnimatedTile::Goal).tiles.len(), 1);
    }

    #[test]
    fn bm_prefix_skips_preview_bitmap() {
        let mut bytes = vec![b'B', b'M', 0, 0, 0, 0];
        let offset = 6u32;
        bytes[2..6].copy_from_slice(&offset.to_le_bytes());
        bytes.extend_from_slice(&packed(1, 1, 5).to_le_bytes());

        let map = Map::from_bytes(&bytes).unwrap();
        assert_eq!(map.get_tile_id(1, 1), 5);
    }

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let map = Map::empty();
        assert_eq!(map.get_tile_id(2000, 2000), OUT_OF_BOUNDS_TILE);
    }

    #[test]
    fn multi_tile_footprint_fills_every_cell() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&packed(100, 100, 219).to_le_bytes()); // space station, 6x6
        let map = Map::from_bytes(&bytes).unwrap();
        for j in 0..6 {
            for k in 0..6 {
                assert_eq!(map.get_tile_id(100 + k, 100 + j), 219);
            }
        }
    }

    #[test]
    fn door_reseed_flags_closing_doors() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&packed(3, 3, FIRST_DOOR_ID).to_le_bytes());
        let mut map = Map::from_bytes(&bytes).unwrap();

        map.set_tile_id(3, 3, OPEN_DOOR_ID);
        let closed = map.seed_doors(0x00);
        // whether it closed depends on the table for seed 0; just assert it runs
        // and tile state stays consistent with whatever the table produced.
        let now_id = map.get_tile_id(3, 3);
        if now_id != OPEN_DOOR_ID {
            assert_eq!(closed.len(), 1);
        } else {
            assert!(closed.is_empty());
        }
    }

    #[test]
    fn checksum_is_pure_function_of_key_and_tiles() {
        let map = Map::empty();
        assert_eq!(map.checksum(7), map.checksum(7));
    }

    #[test]
    fn cast_hits_a_wall_tile() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&packed(10, 0, 1).to_le_bytes());
        let map = Map::from_bytes(&bytes).unwrap();

        let hit = map.cast(Vec2::new(0.5, 0.5), Vec2::new(1.0, 0.0), 100.0, 0, None);
        assert!(hit.hit);
        assert!(hit.distance < 100.0);
    }

    #[test]
    fn cast_reports_no_hit_when_path_is_clear() {
        let map = Map::empty();
        let hit = map.cast(Vec2::new(0.5, 0.5), Vec2::new(1.0, 0.0), 5.0, 0, None);
        assert!(!hit.hit);
        assert_eq!(hit.distance, 5.0);
    }
}
