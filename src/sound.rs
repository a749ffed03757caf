//! Modules used to build the client executable.
pub mod client;
pub mod jitter_buffer;
pub mod log_renderer;
pub mod midi_input;
pub mod note_socket;
pub mod peer;
pub mod scheduler;
