//! Execution side: engine session, executor and the result/progress channel

pub mod executor;
pub mod progress;
pub mod session;

pub use executor::{Executor, SourceMedia};
pub use progress::{ChannelSink, LoggingSink, ProgressChannel, ProgressEvent};
pub use session::EngineSession;
