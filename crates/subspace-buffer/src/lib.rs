//! Wire-format cursor and generational arena shared by the protocol and
//! simulation crates.

pub mod arena;
pub mod error;
pub mod reader;
pub mod writer;

pub use arena::{Arena, Index};
pub use error::{BufferError, BufferResult};
pub use reader::ByteReader;
pub use writer::ByteWriter;
