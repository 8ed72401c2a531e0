pub mod config;
pub mod init;
pub mod plan;
pub mod serve;
pub mod task;
