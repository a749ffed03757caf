//! error type shared across the crate.
//!
//! Everything that can fail returns this so errors can cross thread
//! boundaries with `?` and still print something useful.
pub type BoxError = std::boxed::Box<
    dyn std::error::Error // must implement Error to satisfy ?
        + std::marker::Send // needed for threads
        + std::marker::Sync, // needed for threads
>;
