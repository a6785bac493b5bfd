pub mod error;
pub mod queue;
pub mod status;
pub mod stream;

pub use error::PipelineError;
pub use queue::{JobHandler, JobQueue, PipelineConfig};
pub use status::{InMemoryStatusStore, StatusStore};
pub use stream::{MemoryStream, Stream, StreamEntry};
