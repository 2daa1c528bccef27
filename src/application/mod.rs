// Application layer - use cases and orchestration over the entry store

pub mod error;
mod locks;
mod service;

pub use error::*;
pub use locks::*;
pub use service::*;
