/// The kind of projectile/effect a [`WeaponData`] describes.
///
/// Bit width (5 bits) and numeric values follow `original_source`'s
/// `WeaponType` enum rather than the glossary's illustrative 4-bit layout,
/// since Thor (8) doesn't fit in 4 bits and the wire format must round-trip
/// through a real zone server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponType {
    None,
    Bullet,
    BouncingBullet,
    Bomb,
    ProximityBomb,
    Repel,
    Decoy,
    Burst,
    Thor,
}

impl WeaponType {
    pub fn from_u16(value: u16) -> WeaponType {
        match value {
            1 => WeaponType::Bullet,
            2 => WeaponType::BouncingBullet,
            3 => WeaponType::Bomb,
            4 => WeaponType::ProximityBomb,
            5 => WeaponType::Repel,
            6 => WeaponType::Decoy,
            7 => WeaponType::Burst,
            8 => WeaponType::Thor,
            _ => WeaponType::None,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            WeaponType::None => 0,
            WeaponType::Bullet => 1,
            WeaponType::BouncingBullet => 2,
            WeaponType::Bomb => 3,
            WeaponType::ProximityBomb => 4,
            WeaponType::Repel => 5,
            WeaponType::Decoy => 6,
            WeaponType::Burst => 7,
            WeaponType::Thor => 8,
        }
    }

    pub fn is_bomb_like(self) -> bool {
        matches!(self, WeaponType::Bomb | WeaponType::ProximityBomb | WeaponType::Thor)
    }

    pub fn is_bullet_like(self) -> bool {
        matches!(self, WeaponType::Bullet | WeaponType::BouncingBullet)
    }

    pub fn bounces(self) -> bool {
        matches!(self, WeaponType::BouncingBullet)
    }
}

/// The packed weapon-field bitset carried in position packets:
/// `{type:5, level:2, shrap_bouncing:1, shrap_level:2, shrap:5, alternate:1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeaponData {
    pub kind: u16,
    pub level: u16,
    pub shrap_bouncing: bool,
    pub shrap_level: u16,
    pub shrap: u16,
    pub alternate: bool,
}

impl WeaponData {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn weapon_type(&self) -> WeaponType {
        WeaponType::from_u16(self.kind)
    }

    pub fn from_u16(raw: u16) -> Self {
        WeaponData {
            kind: raw & 0x1F,
            level: (raw >> 5) & 0x3,
            shrap_bouncing: (raw >> 7) & 0x1 != 0,
            shrap_level: (raw >> 8) & 0x3,
            shrap: (raw >> 10) & 0x1F,
            alternate: (raw >> 15) & 0x1 != 0,
        }
    }

    pub fn to_u16(self) -> u16 {
        (self.kind & 0x1F)
            | ((self.level & 0x3) << 5)
            | ((self.shrap_bouncing as u16) << 7)
            | ((self.shrap_level & 0x3) << 8)
            | ((self.shrap & 0x1F) << 10)
            | ((self.alternate as u16) << 15)
    }

    pub fn is_none(&self) -> bool {
        self.kind == 0
    }

    /// A plain mine is a bomb/proximity-bomb fired with the "alternate"
    /// (bomb-key) input held.
    pub fn is_mine(&self) -> bool {
        self.weapon_type().is_bomb_like() && self.alternate && self.weapon_type() != WeaponType::Thor
    }
}

bitflags::bitflags! {
    /// Simulation-local flags carried on a live [`crate::WeaponData`]
    /// instance rather than the wire bitset itself: whether a bomb was
    /// fired under an EMP prize, and whether a burst has gone "active"
    /// (collides with players) after its first wall contact.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WeaponFlags: u8 {
        const EMP          = 0x01;
        const BURST_ACTIVE = 0x02;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u16() {
        let data = WeaponData {
            kind: WeaponType::ProximityBomb.as_u16(),
            level: 2,
            shrap_bouncing: true,
            shrap_level: 1,
            shrap: 17,
            alternate: true,
        };

        let raw = data.to_u16();
        let back = WeaponData::from_u16(raw);
        assert_eq!(data, back);
    }

    #[test]
    fn mine_requires_alternate_bomb() {
        let bomb = WeaponData {
            kind: WeaponType::Bomb.as_u16(),
            alternate: true,
            ..Default::default()
        };
        assert!(bomb.is_mine());

        let bullet = WeaponData {
            kind: WeaponType::Bullet.as_u16(),
            alternate: true,
            ..Default::default()
        };
        assert!(!bullet.is_mine());
    }
}
