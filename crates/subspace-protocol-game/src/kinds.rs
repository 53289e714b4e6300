/// Top-level game packet type byte (0x01-0x4E). Only the kinds this client
/// core acts on are enumerated; everything else round-trips as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    /// Assigns (or reassigns) the local player's own id; resets the player
    /// table. Its handler (`Game::OnPlayerId`) is in the source material but
    /// the filtered pack doesn't carry the byte it's registered under, so
    /// `0x08` is used here — the next slot spec.md's wire table leaves open
    /// between `Chat` (0x07) and `PasswordResponse` (0x0A).
    SelfPlayerId,
    PlayerEntering,
    PlayerLeaving,
    LargePosition,
    SmallPosition,
    Chat,
    PasswordResponse,
    CollectedPrize,
    FlagClaim,
    FlagDrop,
    PlayerDeath,
    FreqChange,
    Security,
    MapInformation,
    CompressedMap,
    ArenaLogin,
    Unknown(u8),
}

impl GameKind {
    pub const ALL: [GameKind; 15] = [
        GameKind::SelfPlayerId,
        GameKind::PlayerEntering,
        GameKind::PlayerLeaving,
        GameKind::LargePosition,
        GameKind::SmallPosition,
        GameKind::Chat,
        GameKind::PasswordResponse,
        GameKind::CollectedPrize,
        GameKind::FlagClaim,
        GameKind::FlagDrop,
        GameKind::PlayerDeath,
        GameKind::FreqChange,
        GameKind::Security,
        GameKind::MapInformation,
        GameKind::CompressedMap,
    ];

    pub fn from_u8(v: u8) -> GameKind {
        match v {
            0x08 => GameKind::SelfPlayerId,
            0x03 => GameKind::PlayerEntering,
            0x04 => GameKind::PlayerLeaving,
            0x05 => GameKind::LargePosition,
            0x06 => GameKind::SmallPosition,
            0x07 => GameKind::Chat,
            0x0A => GameKind::PasswordResponse,
            0x0D => GameKind::FlagClaim,
            0x0F => GameKind::FlagDrop,
            0x12 => GameKind::PlayerDeath,
            0x16 => GameKind::CollectedPrize,
            0x18 => GameKind::FreqChange,
            0x1A => GameKind::Security,
            0x29 => GameKind::MapInformation,
            0x2A => GameKind::CompressedMap,
            0x01 => GameKind::ArenaLogin,
            other => GameKind::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            GameKind::SelfPlayerId => 0x08,
            GameKind::PlayerEntering => 0x03,
            GameKind::PlayerLeaving => 0x04,
            GameKind::LargePosition => 0x05,
            GameKind::SmallPosition => 0x06,
            GameKind::Chat => 0x07,
            GameKind::PasswordResponse => 0x0A,
            GameKind::FlagClaim => 0x0D,
            GameKind::FlagDrop => 0x0F,
            GameKind::PlayerDeath => 0x12,
            GameKind::CollectedPrize => 0x16,
            GameKind::FreqChange => 0x18,
            GameKind::Security => 0x1A,
            GameKind::MapInformation => 0x29,
            GameKind::CompressedMap => 0x2A,
            GameKind::ArenaLogin => 0x01,
            GameKind::Unknown(v) => v,
        }
    }
}
