//! Transport-level concerns shared by every zone connection: the two
//! legacy ciphers, the reliable/chunked packet sequencer, and a
//! registration-order packet dispatcher. Nothing here knows about game
//! packet layouts or simulation state.

pub mod cipher;
pub mod continuum;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod mangled_md5;
pub mod rng;
pub mod sequencer;
pub mod vie;

pub use cipher::CipherScheme;
pub use continuum::{ContinuumCipher, ContinuumState};
pub use dispatcher::PacketDispatcher;
pub use error::{ProtocolError, ProtocolResult};
pub use rng::VieRng;
pub use sequencer::{PacketSequencer, PacketSink};
pub use vie::{vie_checksum, VieCipher};
