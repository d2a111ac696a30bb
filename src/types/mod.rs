// lasttab shared type definitions
// Each submodule defines types used across the tracker, resolver and host.

pub mod action;
pub mod errors;
pub mod settings;
pub mod snapshot;
pub mod tab;
