pub mod api;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod io;
pub mod logger;
pub mod storage;

pub use domain::*;
pub use storage::{EntryStore, Repository};
