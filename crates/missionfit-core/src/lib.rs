pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod plan;
pub mod profile;
pub mod session;
pub mod store;
pub mod task;

pub use error::{MissionError, Result};
