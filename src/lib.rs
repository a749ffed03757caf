//! netkeys - shared virtual instrument library
//!
//! provides library elements to create a relay hub that fans note events out
//! to everybody in a session, and a client that plays those events back at a
//! musically coherent local time despite unknown network latency.
pub mod common;
pub mod server;
pub mod sound;
