use crate::rng::VieRng;

const KEYSTREAM_BYTES: usize = 520;

/// The original VIE/SubSpace stream cipher: a 520-byte keystream generated
/// by [`VieRng`], consumed 4 bytes at a time and chained with the previous
/// ciphertext word as an IV.
#[derive(Debug, Clone)]
pub struct VieCipher {
    client_key: u32,
    session_key: u32,
    keystream: [u8; KEYSTREAM_BYTES],
}

impl Default for VieCipher {
    fn default() -> Self {
        Self { client_key: 0, session_key: 0, keystream: [0; KEYSTREAM_BYTES] }
    }
}

impl VieCipher {
    pub fn new(client_key: u32) -> Self {
        Self { client_key, ..Default::default() }
    }

    /// A fresh unpredictable client key to open a VIE handshake with.
    ///
    /// The source seeds this from the current tick mixed through the C
    /// runtime's `rand`/`srand`, whose exact output is implementation
    /// defined and isn't something worth byte-matching here — the server
    /// only needs a value that's unpredictable and distinguishable from the
    /// all-zero disabled-encryption key, which a local RNG satisfies.
    pub fn generate_key(tick: u32, rng: &mut VieRng) -> u32 {
        let edx = tick.wrapping_mul(0xCCCC_CCCD);
        let mut res = ((rng.next() % 65535) << 16).wrapping_add(edx >> 3).wrapping_add(rng.next() % 65535);
        res = res ^ edx;
        res = res.wrapping_sub(edx);
        if res <= 0x7FFF_FFFF {
            res = (!res).wrapping_add(1);
        }
        res
    }

    pub fn is_valid_key(&self, server_key: u32) -> bool {
        server_key == self.session_key
            || server_key == self.client_key
            || server_key == (!self.client_key).wrapping_add(1)
    }

    /// Derives the session key and keystream from the server's handshake
    /// reply. Returns `false` if `server_key` doesn't match one of the
    /// three values the handshake is allowed to echo.
    pub fn initialize(&mut self, server_key: u32) -> bool {
        if !self.is_valid_key(server_key) {
            return false;
        }

        if self.client_key == server_key {
            self.session_key = 0;
            self.keystream = [0; KEYSTREAM_BYTES];
        } else {
            self.session_key = server_key;
            let mut rng = VieRng::new(self.session_key);
            for chunk in self.keystream.chunks_exact_mut(2) {
                chunk.copy_from_slice(&rng.next_encrypt().to_le_bytes());
            }
        }

        true
    }

    pub fn is_enabled(&self) -> bool {
        self.session_key != 0
    }

    pub fn encrypt(&self, pkt: &[u8]) -> Vec<u8> {
        let mut dest = pkt.to_vec();
        if !self.is_enabled() {
            return dest;
        }

        let size = pkt.len();
        let mut i = 1;
        let mut iv = self.session_key;

        if pkt[0] == 0 {
            if size <= 2 {
                return dest;
            }
            i += 1;
        }

        let mut ksi = 0;
        while i + 4 <= size {
            let word = u32::from_le_bytes(pkt[i..i + 4].try_into().unwrap());
            let key_word = u32::from_le_bytes(self.keystream[ksi..ksi + 4].try_into().unwrap());
            iv = word ^ key_word ^ iv;
            dest[i..i + 4].copy_from_slice(&iv.to_le_bytes());
            i += 4;
            ksi += 4;
        }

        let diff = size - i;
        if diff > 0 {
            let mut remaining = [0u8; 4];
            remaining[..diff].copy_from_slice(&pkt[i..size]);
            let mut word = u32::from_le_bytes(remaining);
            let key_word = u32::from_le_bytes(self.keystream[ksi..ksi + 4].try_into().unwrap());
            word ^= key_word ^ iv;
            dest[i..size].copy_from_slice(&word.to_le_bytes()[..diff]);
        }

        dest
    }

    pub fn decrypt(&self, pkt: &mut [u8]) {
        if !self.is_enabled() {
            return;
        }

        let size = pkt.len();
        let mut i = 1;
        let mut iv = self.session_key;

        if pkt[0] == 0 {
            if size <= 2 {
                return;
            }
            i += 1;
        }

        let mut ksi = 0;
        while i + 4 <= size {
            let edx = u32::from_le_bytes(pkt[i..i + 4].try_into().unwrap());
            let key_word = u32::from_le_bytes(self.keystream[ksi..ksi + 4].try_into().unwrap());
            let plain = key_word ^ iv ^ edx;
            pkt[i..i + 4].copy_from_slice(&plain.to_le_bytes());
            iv = edx;
            i += 4;
            ksi += 4;
        }

        let diff = size - i;
        if diff > 0 {
            let mut remaining = [0u8; 4];
            remaining[..diff].copy_from_slice(&pkt[i..size]);
            let mut word = u32::from_le_bytes(remaining);
            let key_word = u32::from_le_bytes(self.keystream[ksi..ksi + 4].try_into().unwrap());
            word ^= key_word ^ iv;
            pkt[i..size].copy_from_slice(&word.to_le_bytes()[..diff]);
        }
    }
}

/// The magic-constant checksum the client reports in the login security
/// packet when running under the classic cipher. The constants come from
/// disassembling the real client and have no semantic meaning beyond
/// "matches what a real client reports".
pub fn vie_checksum(key: u32) -> u32 {
    let mut csum: u32 = 0;
    let k = key;

    let mut part = 0xc98ed41fu32;
    part = part.wrapping_add(0x3e1bc | k);
    part ^= 0x42435942 ^ k;
    part = part.wrapping_add(0x1d895300 | k);
    part ^= 0x6b5c4032 ^ k;
    part = part.wrapping_add(0x467e44 | k);
    part ^= 0x516c7eda ^ k;
    part = part.wrapping_add(0x8b0c708b | k);
    part ^= 0x6b3e3429 ^ k;
    part = part.wrapping_add(0x560674c9 | k);
    part ^= 0xf4e6b721 ^ k;
    part = part.wrapping_add(0xe90cc483 | k);
    part ^= 0x80ece15a ^ k;
    part = part.wrapping_add(0x728bce33 | k);
    part ^= 0x1fc5d1e6 ^ k;
    part = part.wrapping_add(0x8b0c518b | k);
    part ^= 0x24f1a96e ^ k;
    part = part.wrapping_add(0x30ae0c1 | k);
    part ^= 0x8858741b ^ k;
    csum = csum.wrapping_add(part);

    part = 0x9c15857d;
    part = part.wrapping_add(0x424448b | k);
    part ^= 0xcd0455ee ^ k;
    part = part.wrapping_add(0x727 | k);
    part ^= 0x8d7f29cd ^ k;
    csum = csum.wrapping_add(part);

    part = 0x824b9278;
    part = part.wrapping_add(0x6590 | k);
    part ^= 0x8e16169a ^ k;
    part = part.wrapping_add(0x8b524914 | k);
    part ^= 0x82dce03a ^ k;
    part = part.wrapping_add(0xfa83d733 | k);
    part ^= 0xb0955349 ^ k;
    part = part.wrapping_add(0xe8000003 | k);
    part ^= 0x7cfe3604 ^ k;
    csum = csum.wrapping_add(part);

    part = 0xe3f8d2af;
    part = part.wrapping_add(0x2de85024 | k);
    part ^= 0xbed0296b ^ k;
    part = part.wrapping_add(0x587501f8 | k);
    part ^= 0xada70f65 ^ k;
    csum = csum.wrapping_add(part);

    part = 0xcb54d8a0;
    part = part.wrapping_add(0xf000001 | k);
    part ^= 0x330f19ff ^ k;
    part = part.wrapping_add(0x909090c3 | k);
    part ^= 0xd20f9f9f ^ k;
    part = part.wrapping_add(0x53004add | k);
    part ^= 0x5d81256b ^ k;
    part = part.wrapping_add(0x8b004b65 | k);
    part ^= 0xa5312749 ^ k;
    part = part.wrapping_add(0xb8004b67 | k);
    part ^= 0x8adf8fb1 ^ k;
    part = part.wrapping_add(0x8901e283 | k);
    part ^= 0x8ec94507 ^ k;
    part = part.wrapping_add(0x89d23300 | k);
    part ^= 0x1ff8e1dc ^ k;
    part = part.wrapping_add(0x108a004a | k);
    part ^= 0xc73d6304 ^ k;
    part = part.wrapping_add(0x43d2d3 | k);
    part ^= 0x6f78e4ff ^ k;
    csum = csum.wrapping_add(part);

    part = 0x45c23f9;
    part = part.wrapping_add(0x47d86097 | k);
    part ^= 0x7cb588bd ^ k;
    part = part.wrapping_add(0x9286 | k);
    part ^= 0x21d700f8 ^ k;
    part = part.wrapping_add(0xdf8e0fd9 | k);
    part ^= 0x42796c9e ^ k;
    part = part.wrapping_add(0x8b000003 | k);
    part ^= 0x3ad32a21 ^ k;
    csum = csum.wrapping_add(part);

    part = 0xb229a3d0;
    part = part.wrapping_add(0x47d708 | k);
    part ^= 0x10b0a91 ^ k;
    csum = csum.wrapping_add(part);

    part = 0x466e55a7;
    part = part.wrapping_add(0xc7880d8b | k);
    part ^= 0x44ce7067 ^ k;
    part = part.wrapping_add(0xe4 | k);
    part ^= 0x923a6d44 ^ k;
    part = part.wrapping_add(0x640047d6 | k);
    part ^= 0xa62d606c ^ k;
    part = part.wrapping_add(0x2bd1f7ae | k);
    part ^= 0x2f5621fb ^ k;
    part = part.wrapping_add(0x8b0f74ff | k);
    part ^= 0x2928b332;
    csum = csum.wrapping_add(part);

    csum = csum.wrapping_add(0x62cf369a);

    csum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_when_client_key_echoed_back() {
        let mut cipher = VieCipher::new(0x1234);
        assert!(cipher.initialize(0x1234));
        assert!(!cipher.is_enabled());
        let pkt = vec![1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(cipher.encrypt(&pkt), pkt);
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let mut cipher = VieCipher::new(0x1111_1111);
        assert!(cipher.initialize(0x2222_2222));
        assert!(cipher.is_enabled());

        for payload in [
            vec![1, 9, 9, 9, 9, 9],
            vec![5, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            vec![0, 1, 2],
        ] {
            let mut encrypted = cipher.encrypt(&payload);
            cipher.decrypt(&mut encrypted);
            assert_eq!(encrypted, payload);
        }
    }

    #[test]
    fn rejects_server_key_outside_the_handshake_contract() {
        let cipher = VieCipher::new(5);
        assert!(!cipher.is_valid_key(999));
    }

    #[test]
    fn checksum_is_pure_function_of_key() {
        assert_eq!(vie_checksum(42), vie_checksum(42));
        assert_ne!(vie_checksum(1), vie_checksum(2));
    }
}
