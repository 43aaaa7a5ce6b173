pub mod commit;
pub mod config;
pub mod error;
pub mod gate;
pub mod git;
pub mod manifest;
pub mod package_manager;
pub mod paths;
pub mod report;

pub use error::{FlowError, Result};
