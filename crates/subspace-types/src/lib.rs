//! Core value types shared by every crate in the SubSpace/Continuum client core.
//!
//! Kept free of protocol and simulation logic so it can be depended on from
//! both the wire layer and the simulation layer without a cycle.

pub mod tick;
pub mod vec2;
pub mod weapon;

pub use tick::Tick;
pub use vec2::{Vec2, Vec2i, Vec2s};
pub use weapon::{WeaponData, WeaponFlags, WeaponType};

/// Identifies a player within an arena. Assigned by the server.
pub type PlayerId = u16;

/// Team number. Players on the same frequency are teammates.
pub type Frequency = u16;

/// A tile id in the 0..=255 map grid. See [`subspace_types::tile`].
pub type TileId = u8;

/// Ship slot 0..=7; 8 means spectator.
pub type ShipId = u8;

/// A tile id that marks a spot as impassable when a map read falls outside
/// the 1024x1024 grid.
pub const OUT_OF_BOUNDS_TILE: TileId = 20;

/// The well-known safe-zone tile id. Disables firing and drops flags.
pub const SAFE_TILE: TileId = 171;

/// The first door tile id. Doors occupy `FIRST_DOOR_TILE..=LAST_DOOR_TILE`.
pub const FIRST_DOOR_TILE: TileId = 162;

/// The last door tile id.
pub const LAST_DOOR_TILE: TileId = 169;

/// The tile id doors settle on when fully open (one past the last closed id).
pub const OPEN_DOOR_TILE: TileId = LAST_DOOR_TILE + 1;

/// Brick-owned tile id. Walkable for the owning team only.
pub const BRICK_TILE: TileId = 250;

bitflags::bitflags! {
    /// Per-player status toggles carried in position packets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusFlags: u8 {
        const STEALTH   = 0x01;
        const CLOAK     = 0x02;
        const XRADAR    = 0x04;
        const ANTIWARP  = 0x08;
        const FLASH     = 0x10;
        const FLASHING  = 0x20;
        const UFO       = 0x40;
    }
}

bitflags::bitflags! {
    /// Capabilities a prize has granted the local ship. Distinct from
    /// [`StatusFlags`]: a capability bit only says the player is *allowed*
    /// to turn the matching status on; the player's own fire-control input
    /// decides whether it's actually active right now.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ShipCapability: u16 {
        const STEALTH          = 0x0001;
        const CLOAK            = 0x0002;
        const XRADAR           = 0x0004;
        const ANTIWARP         = 0x0008;
        const MULTIFIRE        = 0x0010;
        const PROXIMITY        = 0x0020;
        const BOUNCING_BULLETS = 0x0040;
    }
}

/// Returns true if `tile` is one of the always-solid wall/border ids, not
/// accounting for bricks (brick solidity depends on frequency and is
/// resolved by `subspace_world::Map::is_solid`).
pub fn is_solid_tile_id(id: TileId) -> bool {
    if id == 0 {
        return false;
    }
    if (FIRST_DOOR_TILE..=LAST_DOOR_TILE).contains(&id) {
        return true;
    }
    if id < 170 {
        return true;
    }
    if (192..=240).contains(&id) {
        return true;
    }
    if (242..=252).contains(&id) {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_tile_not_solid() {
        assert!(!is_solid_tile_id(SAFE_TILE));
    }

    #[test]
    fn wall_ids_solid() {
        assert!(is_solid_tile_id(1));
        assert!(is_solid_tile_id(160));
        assert!(is_solid_tile_id(FIRST_DOOR_TILE));
        assert!(is_solid_tile_id(LAST_DOOR_TILE));
    }

    #[test]
    fn empty_tile_not_solid() {
        assert!(!is_solid_tile_id(0));
    }
}
