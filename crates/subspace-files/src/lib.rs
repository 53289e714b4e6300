pub mod cache;
pub mod error;
pub mod requester;

pub use cache::FileCache;
pub use error::{FileError, FileResult};
pub use requester::{FileRequest, FileRequester, RequestOutcome};
