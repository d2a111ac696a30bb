//! lasttab: tracks recently used browser tabs and switches back to the last one.
//!
//! This library crate exposes all modules for use by the host binary and
//! integration tests.

pub mod app;
pub mod browser;
pub mod database;
pub mod managers;
pub mod platform;
pub mod protocol;
pub mod rpc_handler;
pub mod services;
pub mod storage;
pub mod types;
