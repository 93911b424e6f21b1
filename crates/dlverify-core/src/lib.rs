pub mod config;
pub mod logging;

pub mod control;
pub mod digest;
pub mod engine;
pub mod extract;
pub mod runtime;
pub mod signal;
pub mod verify;
