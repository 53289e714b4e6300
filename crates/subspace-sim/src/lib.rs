pub mod player;
pub mod settings;
pub mod ship;
pub mod soccer;
pub mod visibility;
pub mod weapon;

pub use player::{Player, PlayerEvent, PlayerManager, Vec2f};
pub use settings::{ArenaSettings, ShipSettings};
pub use ship::{FireInput, HitOutcome, Prize, ShipController};
pub use soccer::{BallState, Powerball, Soccer};
pub use visibility::{RadarCategory, RadarIndicator};
pub use weapon::{Weapon, WeaponManager, WeaponOutcome};
