pub mod engine;
pub mod types;

pub use engine::DiffEngine;
pub use types::DiffResult;
