use std::collections::HashMap;

use subspace_types::{PlayerId, Tick};

use crate::map::Map;
use crate::tile::BRICK_TILE_ID;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrickTile {
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct Brick {
    pub tile: BrickTile,
    pub id: u16,
    pub team: u16,
    pub end_tick: Tick,
}

/// Timed, team-owned wall segments. Bricks decay once `end_tick` passes and
/// the underlying map tile reverts to empty.
#[derive(Debug, Default)]
pub struct BrickManager {
    bricks: Vec<Brick>,
    by_tile: HashMap<BrickTile, usize>,
}

impl BrickManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Brick> {
        self.by_tile.get(&BrickTile { x, y }).map(|&i| &self.bricks[i])
    }

    pub fn insert(&mut self, x: u16, y: u16, team: u16, id: u16, brick_time: u32, local_timestamp: Tick) {
        let tile = BrickTile { x, y };
        let brick = Brick { tile, id, team, end_tick: local_timestamp.advance(brick_time) };

        if let Some(&idx) = self.by_tile.get(&tile) {
            self.bricks[idx] = brick;
        } else {
            self.by_tile.insert(tile, self.bricks.len());
            self.bricks.push(brick);
        }
    }

    /// Lays down every tile along the `(x1,y1)..(x2,y2)` drop line, one
    /// brick per unit step, matching a `BrickDropped` packet.
    pub fn insert_line(
        &mut self,
        start: (f32, f32),
        end: (f32, f32),
        team: u16,
        id: u16,
        brick_time: u32,
        local_timestamp: Tick,
    ) {
        let (sx, sy) = start;
        let (ex, ey) = end;
        let dx = ex - sx;
        let dy = ey - sy;
        let distance = (dx * dx + dy * dy).sqrt();
        let direction = if distance > f32::EPSILON { (dx / distance, dy / distance) } else { (0.0, 0.0) };

        let mut pos = (sx, sy);
        let mut i = 0.0f32;
        while i <= distance {
            self.insert(pos.0 as u16, pos.1 as u16, team, id, brick_time, local_timestamp);
            pos = (pos.0 + direction.0, pos.1 + direction.1);
            i += 1.0;
        }
    }

    /// Removes every brick whose `end_tick` has passed and clears its tile
    /// on `map`. Returns the ids of bricks removed this call.
    pub fn expire(&mut self, map: &mut Map, now: Tick) -> Vec<u16> {
        let mut expired_ids = Vec::new();
        let mut survivors = Vec::with_capacity(self.bricks.len());

        for brick in self.bricks.drain(..) {
            if now.diff(brick.end_tick) > 0 {
                map.set_tile_id(brick.tile.x, brick.tile.y, 0);
                expired_ids.push(brick.id);
            } else {
                map.set_tile_id(brick.tile.x, brick.tile.y, BRICK_TILE_ID);
                survivors.push(brick);
            }
        }

        self.bricks = survivors;
        self.by_tile.clear();
        for (idx, brick) in self.bricks.iter().enumerate() {
            self.by_tile.insert(brick.tile, idx);
        }

        expired_ids
    }

    pub fn clear(&mut self) {
        self.bricks.clear();
        self.by_tile.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Brick> {
        self.bricks.iter()
    }
}

/// Self id placeholder used for the warp-on-overlap check performed by the
/// simulation layer after a brick line is inserted (kept here only as a
/// documented seam; `BrickManager` itself never touches player state).
pub type OverlapOwner = PlayerId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_expire_clears_tile() {
        let mut map = Map::empty();
        let mut bricks = BrickManager::new();
        bricks.insert(5, 5, 1, 99, 100, Tick::new(0));
        assert!(bricks.get(5, 5).is_some());

        let expired = bricks.expire(&mut map, Tick::new(50));
        assert!(expired.is_empty());
        assert_eq!(map.get_tile_id(5, 5), BRICK_TILE_ID);

        let expired = bricks.expire(&mut map, Tick::new(200));
        assert_eq!(expired, vec![99]);
        assert_eq!(map.get_tile_id(5, 5), 0);
        assert!(bricks.get(5, 5).is_none());
    }

    #[test]
    fn insert_line_covers_every_unit_step() {
        let mut bricks = BrickManager::new();
        bricks.insert_line((0.0, 0.0), (3.0, 0.0), 1, 1, 100, Tick::new(0));
        assert!(bricks.get(0, 0).is_some());
        assert!(bricks.get(3, 0).is_some());
    }
}
