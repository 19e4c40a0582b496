//! Process exit codes.
//!
//! `2` is left to clap for usage errors.

/// Command completed.
pub const SUCCESS: u8 = 0;

/// Any failure without a more specific code.
pub const GENERAL_ERROR: u8 = 1;

/// The server could not bind its listening address.
pub const BIND_FAILED: u8 = 3;

/// The operating system refused access to a file.
pub const PERMISSION_DENIED: u8 = 5;

/// A path resolved inside the root but nothing exists there.
pub const NOT_FOUND: u8 = 7;

/// Interrupted before completion.
pub const CANCELLED: u8 = 130;
