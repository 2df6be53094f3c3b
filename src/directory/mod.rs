//! Worker directory: searchable list of registered workers.

pub mod engine;
pub mod fixtures;
pub mod model;

pub use engine::{CardAction, DirectoryEngine, DirectoryView, can_request};
pub use model::{DirectorySnapshot, FilterCriteria, WorkerProfile};
