use subspace_buffer::ByteWriter;

/// Subtypes carried under the `0x00` core packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreType {
    EncryptionRequest,
    EncryptionResponse,
    Reliable,
    Ack,
    SyncRequest,
    SyncResponse,
    Disconnect,
    SmallChunkBody,
    SmallChunkTail,
    HugeChunk,
    HugeChunkCancel,
    Cluster,
    ContinuumEncResponse,
    ContinuumEncAck,
    ContinuumKeyExpansionRequest,
    ContinuumKeyExpansionResponse,
}

impl CoreType {
    pub fn from_u8(v: u8) -> Option<CoreType> {
        Some(match v {
            0x01 => CoreType::EncryptionRequest,
            0x02 => CoreType::EncryptionResponse,
            0x03 => CoreType::Reliable,
            0x04 => CoreType::Ack,
            0x05 => CoreType::SyncRequest,
            0x06 => CoreType::SyncResponse,
            0x07 => CoreType::Disconnect,
            0x08 => CoreType::SmallChunkBody,
            0x09 => CoreType::SmallChunkTail,
            0x0A => CoreType::HugeChunk,
            0x0B => CoreType::HugeChunkCancel,
            0x0E => CoreType::Cluster,
            0x10 => CoreType::ContinuumEncResponse,
            0x11 => CoreType::ContinuumEncAck,
            0x12 => CoreType::ContinuumKeyExpansionRequest,
            0x13 => CoreType::ContinuumKeyExpansionResponse,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        match self {
            CoreType::EncryptionRequest => 0x01,
            CoreType::EncryptionResponse => 0x02,
            CoreType::Reliable => 0x03,
            CoreType::Ack => 0x04,
            CoreType::SyncRequest => 0x05,
            CoreType::SyncResponse => 0x06,
            CoreType::Disconnect => 0x07,
            CoreType::SmallChunkBody => 0x08,
            CoreType::SmallChunkTail => 0x09,
            CoreType::HugeChunk => 0x0A,
            CoreType::HugeChunkCancel => 0x0B,
            CoreType::Cluster => 0x0E,
            CoreType::ContinuumEncResponse => 0x10,
            CoreType::ContinuumEncAck => 0x11,
            CoreType::ContinuumKeyExpansionRequest => 0x12,
            CoreType::ContinuumKeyExpansionResponse => 0x13,
        }
    }
}

/// The fixed 6-byte header prefixing a reliable message's body: `{0x00,
/// 0x03, id:u32}`.
pub const RELIABLE_HEADER_SIZE: usize = 6;

pub fn build_reliable(id: u32, body: &[u8]) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(RELIABLE_HEADER_SIZE + body.len());
    w.u8(0x00).u8(CoreType::Reliable.as_u8()).u32(id).bytes(body);
    w.into_vec()
}

pub fn build_ack(id: u32) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(6);
    w.u8(0x00).u8(CoreType::Ack.as_u8()).u32(id);
    w.into_vec()
}

pub fn build_sync_request(timestamp: u32, total_sent: u32, total_received: u32) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(14);
    w.u8(0x00).u8(CoreType::SyncRequest.as_u8()).u32(timestamp).u32(total_sent).u32(total_received);
    w.into_vec()
}

pub fn build_encryption_request_vie(client_key: u32) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(7);
    w.u8(0x00).u8(CoreType::EncryptionRequest.as_u8()).u32(client_key).u16(0x01);
    w.into_vec()
}

pub fn build_encryption_request_continuum() -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(7);
    w.u8(0x00).u8(CoreType::EncryptionRequest.as_u8()).u32(1).u16(0x11);
    w.into_vec()
}

pub fn build_continuum_encryption_ack(key1: u32) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(8);
    w.u8(0x00).u8(CoreType::ContinuumEncAck.as_u8()).u32(key1).u16(0x0001);
    w.into_vec()
}

/// Wraps a set of short outbound packets into a single `0x00 0x0E` cluster
/// frame, each prefixed with a one-byte length.
pub fn build_cluster(packets: &[Vec<u8>]) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(2 + packets.iter().map(|p| p.len() + 1).sum::<usize>());
    w.u8(0x00).u8(CoreType::Cluster.as_u8());
    for p in packets {
        w.u8(p.len() as u8).bytes(p);
    }
    w.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliable_frame_has_fixed_header() {
        let frame = build_reliable(7, b"hello");
        assert_eq!(&frame[0..2], &[0x00, 0x03]);
        assert_eq!(u32::from_le_bytes(frame[2..6].try_into().unwrap()), 7);
        assert_eq!(&frame[6..], b"hello");
    }

    #[test]
    fn core_type_round_trips() {
        for &v in &[0x01u8, 0x04, 0x0E, 0x13] {
            let kind = CoreType::from_u8(v).unwrap();
            assert_eq!(kind.as_u8(), v);
        }
    }
}
