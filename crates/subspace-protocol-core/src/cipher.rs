use crate::continuum::ContinuumCipher;
use crate::vie::VieCipher;

/// The two transport ciphers a zone can negotiate. Selected once during the
/// encryption handshake and fixed for the life of the connection.
pub enum CipherScheme {
    Vie(VieCipher),
    Continuum(Box<ContinuumCipher>),
    /// Before the handshake completes, or for a server that disabled
    /// encryption outright.
    None,
}

impl CipherScheme {
    pub fn encrypt(&self, pkt: &[u8]) -> Vec<u8> {
        match self {
            CipherScheme::Vie(c) => c.encrypt(pkt),
            CipherScheme::Continuum(c) => c.encrypt(pkt),
            CipherScheme::None => pkt.to_vec(),
        }
    }

    /// Returns `None` if the packet fails a Continuum CRC check; VIE and
    /// the no-op scheme always succeed.
    pub fn decrypt(&self, pkt: &[u8]) -> Option<Vec<u8>> {
        match self {
            CipherScheme::Vie(c) => {
                let mut buf = pkt.to_vec();
                c.decrypt(&mut buf);
                Some(buf)
            }
            CipherScheme::Continuum(c) => c.decrypt(pkt),
            CipherScheme::None => Some(pkt.to_vec()),
        }
    }
}
