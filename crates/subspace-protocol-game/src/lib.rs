//! Game-layer packet definitions: the arena-state and player-action
//! messages carried once a zone connection is authenticated. Decoding here
//! assumes the envelope/cipher/sequencer layers have already stripped
//! reliability framing and encryption.

pub mod kinds;
pub mod packets;

pub use kinds::GameKind;
pub use packets::{
    ArenaLoginRequest, Chat, CollectedPrize, CompressedMap, FlagClaim, FlagDrop, FreqChange,
    LvzFileInfo, MapInformation, PasswordRequest, PasswordResponse, PlayerDeath, PlayerEntering,
    PlayerLeaving, PositionUpdate, SecurityChallenge, SecurityResponse, SelfPlayerId,
};
