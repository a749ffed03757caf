//! Modules used to build the relay hub executable.
pub mod relay;
pub mod relay_server;
pub mod session_registry;
