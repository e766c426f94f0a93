pub mod cli;
pub mod commands;
pub mod component;
pub mod config;
pub mod init;
pub mod signal;
pub mod tools;
