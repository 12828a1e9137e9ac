// Application layer - Use case interactors

pub mod batch_interactor;
pub mod container;
pub mod editor_session;
pub mod operation_source;
pub mod process_interactor;
pub mod project;

// Re-export interactors
pub use batch_interactor::{BatchInteractor, BatchItem, BatchJob, BatchReport};
pub use container::{AppContainer, DefaultAppContainer};
pub use editor_session::{EditorSession, ProcessingGuard};
pub use operation_source::{load_operations, parse_operations};
pub use process_interactor::{ProcessInteractor, ProcessRequest};
pub use project::Project;
