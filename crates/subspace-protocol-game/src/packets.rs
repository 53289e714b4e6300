use subspace_buffer::{BufferResult, ByteReader, ByteWriter};
use subspace_types::{Frequency, PlayerId, ShipId, StatusFlags, Tick, WeaponData};

/// A player entering the arena, decoded from a `0x03` packet.
#[derive(Debug, Clone)]
pub struct PlayerEntering {
    pub ship: ShipId,
    pub audio: u8,
    pub name: String,
    pub squad: String,
    pub kill_points: u32,
    pub flag_points: u32,
    pub id: PlayerId,
    pub frequency: Frequency,
    pub wins: u16,
    pub losses: u16,
    pub attach_parent: u16,
    pub flags: u16,
    pub koth: u8,
}

impl PlayerEntering {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(PlayerEntering {
            ship: r.u8()?,
            audio: r.u8()?,
            name: r.fixed_string(20)?,
            squad: r.fixed_string(20)?,
            kill_points: r.u32()?,
            flag_points: r.u32()?,
            id: r.u16()?,
            frequency: r.u16()?,
            wins: r.u16()?,
            losses: r.u16()?,
            attach_parent: r.u16()?,
            flags: r.u16()?,
            koth: r.u8()?,
        })
    }
}

/// Assigns (or reassigns, on arena re-entry) the local player's own id.
#[derive(Debug, Clone, Copy)]
pub struct SelfPlayerId {
    pub id: PlayerId,
}

impl SelfPlayerId {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(SelfPlayerId { id: r.u16()? })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerLeaving {
    pub id: PlayerId,
}

impl PlayerLeaving {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(PlayerLeaving { id: r.u16()? })
    }
}

/// A decoded position update, after reconciling the large/small wire forms
/// into one shape. `None` fields mean the sender omitted that optional
/// tail (older clients send shorter position packets).
#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub player_id: PlayerId,
    pub direction: u8,
    pub timestamp: u16,
    pub x: u16,
    pub y: u16,
    pub vel_x: i16,
    pub vel_y: i16,
    pub togglables: StatusFlags,
    pub ping: u8,
    pub bounty: u16,
    pub weapon: WeaponData,
    pub energy: Option<u16>,
    pub s2c_latency: Option<u16>,
    pub timers: Option<u16>,
    pub items: Option<u32>,
}

impl PositionUpdate {
    /// Field order here follows the wire layout exactly: direction,
    /// timestamp, x, vel_y, pid, vel_x, checksum, togglables, ping, y,
    /// bounty, weapon, then the optional trailing fields gated by packet
    /// length.
    pub fn decode_large(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        let direction = r.u8()?;
        let timestamp = r.u16()?;
        let x = r.u16()?;
        let vel_y = r.i16()?;
        let player_id = r.u16()?;
        let vel_x = r.i16()?;
        let _checksum = r.u8()?;
        let togglables = StatusFlags::from_bits_truncate(r.u8()?);
        let ping = r.u8()?;
        let y = r.u16()?;
        let bounty = r.u16()?;
        let weapon = WeaponData::from_u16(r.u16()?);

        let energy = r.u16().ok();
        let s2c_latency = r.u16().ok();
        let timers = r.u16().ok();
        let items = r.u32().ok();

        Ok(PositionUpdate {
            player_id,
            direction,
            timestamp,
            x,
            y,
            vel_x,
            vel_y,
            togglables,
            ping,
            bounty,
            weapon,
            energy,
            s2c_latency,
            timers,
            items,
        })
    }

    /// Small position packets carry the player id in a single byte and
    /// swap the vel_y/y/vel_x ordering relative to the large form.
    pub fn decode_small(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        let direction = r.u8()?;
        let timestamp = r.u16()?;
        let x = r.u16()?;
        let ping = r.u8()?;
        let bounty = r.u8()? as u16;
        let player_id = r.u8()? as u16;
        let togglables = StatusFlags::from_bits_truncate(r.u8()?);
        let vel_y = r.i16()?;
        let y = r.u16()?;
        let vel_x = r.i16()?;

        let energy = r.u16().ok();
        let s2c_latency = r.u16().ok();
        let timers = r.u16().ok();
        let items = r.u32().ok();

        Ok(PositionUpdate {
            player_id,
            direction,
            timestamp,
            x,
            y,
            vel_x,
            vel_y,
            togglables,
            ping,
            bounty,
            weapon: WeaponData::none(),
            energy,
            s2c_latency,
            timers,
            items,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Chat {
    pub kind: u8,
    pub sound: u8,
    pub sender: PlayerId,
    pub message: String,
}

impl Chat {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        let kind = r.u8()?;
        let sound = r.u8()?;
        let sender = r.u16()?;
        let rest = r.rest();
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        let message = String::from_utf8_lossy(&rest[..end]).into_owned();
        Ok(Chat { kind, sound, sender, message })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(4 + self.message.len());
        w.u8(0x07).u8(self.kind).u8(self.sound).u16(self.sender).bytes(self.message.as_bytes()).u8(0);
        w.into_vec()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FreqChange {
    pub player_id: PlayerId,
    pub frequency: Frequency,
}

impl FreqChange {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(FreqChange { player_id: r.u16()?, frequency: r.u16()? })
    }
}

/// The server's checksum-seed challenge, answered by the Security response
/// once local checksums can be computed.
#[derive(Debug, Clone, Copy)]
pub struct SecurityChallenge {
    pub prize_seed: u32,
    pub door_seed: u32,
    pub timestamp: Tick,
    pub checksum_key: u32,
}

impl SecurityChallenge {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(SecurityChallenge {
            prize_seed: r.u32()?,
            door_seed: r.u32()?,
            timestamp: Tick::new(r.u32()?),
            checksum_key: r.u32()?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SecurityResponse {
    pub weapons_received: u32,
    pub settings_checksum: u32,
    pub exe_checksum: u32,
    pub map_checksum: u32,
    pub s2c_slow_total: u16,
    pub s2c_fast_total: u16,
    pub s2c_slow_current: u16,
    pub s2c_fast_current: u16,
    pub ping_current: u16,
    pub ping_average: u16,
    pub ping_low: u16,
    pub ping_high: u16,
}

impl SecurityResponse {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(40);
        w.u8(0x1A)
            .u32(self.weapons_received)
            .u32(self.settings_checksum)
            .u32(self.exe_checksum)
            .u32(self.map_checksum)
            .u16(self.s2c_slow_total)
            .u16(self.s2c_fast_total)
            .u16(self.s2c_slow_current)
            .u16(self.s2c_fast_current)
            .u16(self.ping_current)
            .u16(self.ping_average)
            .u16(self.ping_low)
            .u16(self.ping_high);
        w.into_vec()
    }
}

#[derive(Debug, Clone)]
pub struct MapInformation {
    pub filename: String,
    pub checksum: u32,
    pub compressed_size: u32,
    pub lvz: Vec<LvzFileInfo>,
}

#[derive(Debug, Clone)]
pub struct LvzFileInfo {
    pub filename: String,
    pub checksum: u32,
    pub size: u32,
}

impl MapInformation {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        let filename = r.fixed_string(16)?;
        let checksum = r.u32()?;
        let compressed_size = r.u32()?;

        let mut lvz = Vec::new();
        while r.remaining() >= 24 {
            lvz.push(LvzFileInfo { filename: r.fixed_string(16)?, checksum: r.u32()?, size: r.u32()? });
        }

        Ok(MapInformation { filename, checksum, compressed_size, lvz })
    }
}

#[derive(Debug, Clone)]
pub struct CompressedMap {
    pub filename: String,
    pub deflate_bytes: Vec<u8>,
}

impl CompressedMap {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        let filename = r.fixed_string(16)?;
        let deflate_bytes = r.rest().to_vec();
        Ok(CompressedMap { filename, deflate_bytes })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlagClaim {
    pub flag_id: u16,
    pub player_id: PlayerId,
}

impl FlagClaim {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(FlagClaim { flag_id: r.u16()?, player_id: r.u16()? })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlagDrop {
    pub player_id: PlayerId,
}

impl FlagDrop {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(FlagDrop { player_id: r.u16()? })
    }
}

/// A green pickup resolving into `count` copies of `prize_id`, decoded from
/// a `0x16` packet. Negative `prize_id` is a "bad" prize.
#[derive(Debug, Clone, Copy)]
pub struct CollectedPrize {
    pub count: u16,
    pub prize_id: i16,
}

impl CollectedPrize {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(CollectedPrize { count: r.u16()?, prize_id: r.i16()? })
    }
}

/// A kill notification, decoded from a `0x12` packet. The field layout
/// isn't in the filtered source material (only the packet id is); this
/// follows the standard classic-SubSpace kill-packet shape used by every
/// public protocol writeup of the wire format.
#[derive(Debug, Clone, Copy)]
pub struct PlayerDeath {
    pub green: u8,
    pub killer: PlayerId,
    pub killed: PlayerId,
    pub bounty: u16,
    pub flags: u16,
}

impl PlayerDeath {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(PlayerDeath { green: r.u8()?, killer: r.u16()?, killed: r.u16()?, bounty: r.u16()?, flags: r.u16()? })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordResponse {
    pub code: u8,
}

impl PasswordResponse {
    pub fn decode(payload: &[u8]) -> BufferResult<Self> {
        let mut r = ByteReader::new(payload);
        Ok(PasswordResponse { code: r.u8()? })
    }
}

/// The login credentials packet (`0x09` under the classic cipher, `0x24`
/// under Continuum) sent right after the encryption handshake completes.
///
/// The exact byte layout of the real client's login packet (machine id
/// placement, the "drivers table" tail) is legacy ANSI-C struct padding
/// that wasn't present in the filtered source material; this carries every
/// field spec.md's handshake step names in the order it lists them, which
/// is what any zone actually inspects (name/password) versus what it
/// merely stores (the rest).
#[derive(Debug, Clone)]
pub struct PasswordRequest {
    pub continuum: bool,
    pub registration: bool,
    pub name: String,
    pub password: String,
    pub machine_id: u32,
    pub timezone_bias: i16,
    pub version: u16,
}

impl PasswordRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(96);
        w.u8(if self.continuum { 0x24 } else { 0x09 })
            .u8(self.registration as u8)
            .fixed_string(&self.name, 32)
            .fixed_string(&self.password, 32)
            .u32(self.machine_id)
            .i16(self.timezone_bias)
            .u8(0x04) // connect type: normal client
            .u16(self.version)
            .bytes(&[0u8; 8]); // drivers table, unused by this core
        w.into_vec()
    }
}

#[derive(Debug, Clone)]
pub struct ArenaLoginRequest {
    pub ship: ShipId,
    pub audio: bool,
    pub x_res: u16,
    pub y_res: u16,
    pub arena: u16,
    pub arena_name: String,
    pub want_lvz: bool,
}

impl ArenaLoginRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(64);
        w.u8(0x01)
            .u8(self.ship)
            .u8(self.audio as u8)
            .u16(self.x_res)
            .u16(self.y_res)
            .u16(self.arena)
            .fixed_string(&self.arena_name, 16)
            .u8(self.want_lvz as u8);
        w.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_request_picks_type_byte_from_cipher_scheme() {
        let continuum = PasswordRequest {
            continuum: true,
            registration: false,
            name: "bob".into(),
            password: "secret".into(),
            machine_id: 0x1234,
            timezone_bias: -300,
            version: 40,
        };
        let encoded = continuum.encode();
        assert_eq!(encoded[0], 0x24);

        let classic = PasswordRequest { continuum: false, ..continuum };
        assert_eq!(classic.encode()[0], 0x09);
    }

    #[test]
    fn decodes_player_entering() {
        let mut w = ByteWriter::new();
        w.u8(1) // ship
            .u8(0) // audio
            .fixed_string("tester", 20)
            .fixed_string("", 20)
            .u32(10)
            .u32(3)
            .u16(42)
            .u16(0)
            .u16(1)
            .u16(2)
            .u16(0xFFFF)
            .u16(0)
            .u8(0);
        let pkt = PlayerEntering::decode(&w.into_vec()).unwrap();
        assert_eq!(pkt.name, "tester");
        assert_eq!(pkt.id, 42);
        assert_eq!(pkt.kill_points, 10);
    }

    #[test]
    fn large_position_with_only_required_fields() {
        let mut w = ByteWriter::new();
        w.u8(40) // direction
            .u16(1000) // timestamp
            .u16(512) // x
            .i16(0) // vel_y
            .u16(7) // pid
            .i16(0) // vel_x
            .u8(0) // checksum
            .u8(StatusFlags::STEALTH.bits()) // togglables
            .u8(5) // ping
            .u16(256) // y
            .u16(10) // bounty
            .u16(0); // weapon
        let pkt = PositionUpdate::decode_large(&w.into_vec()).unwrap();
        assert_eq!(pkt.player_id, 7);
        assert_eq!(pkt.x, 512);
        assert_eq!(pkt.energy, None);
        assert!(pkt.togglables.contains(StatusFlags::STEALTH));
    }

    #[test]
    fn large_position_with_full_trailer() {
        let mut w = ByteWriter::new();
        w.u8(0).u16(0).u16(0).i16(0).u16(1).i16(0).u8(0).u8(0).u8(0).u16(0).u16(0).u16(0);
        w.u16(900).u16(50).u16(3).u32(7);
        let pkt = PositionUpdate::decode_large(&w.into_vec()).unwrap();
        assert_eq!(pkt.energy, Some(900));
        assert_eq!(pkt.s2c_latency, Some(50));
        assert_eq!(pkt.timers, Some(3));
        assert_eq!(pkt.items, Some(7));
    }

    #[test]
    fn chat_round_trips() {
        let chat = Chat { kind: 1, sound: 0, sender: 5, message: "hi".into() };
        let encoded = chat.encode();
        let decoded = Chat::decode(&encoded[1..]).unwrap();
        assert_eq!(decoded.message, "hi");
        assert_eq!(decoded.sender, 5);
    }
}
