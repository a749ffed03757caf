//! These modules are shared among both the client and relay executables for netkeys.
pub mod box_error;
pub mod color;
pub mod config;
pub mod note_packet;
pub mod roster;
pub mod sock_with_tos;
pub mod timekeeper;
