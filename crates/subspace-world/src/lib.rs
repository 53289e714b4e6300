//! Arena world state: the tile grid, door reseeding, and timed brick
//! placement. Nothing here knows about players or weapons; the simulation
//! layer queries `Map`/`BrickManager` and feeds back settings changes.

pub mod brick;
pub mod doors;
pub mod error;
pub mod geometry;
pub mod map;
pub mod tile;

pub use brick::{Brick, BrickManager, BrickTile};
pub use doors::DoorSettings;
pub use error::{WorldError, WorldResult};
pub use map::{CastHit, DoorClosed, Map, MAP_DIM};
pub use tile::{AnimatedTile, AnimatedTileSet, RawTile};
