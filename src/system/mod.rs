//! # System Interaction Layer
//!
//! The boundary between command resolution and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: splits command lines, spawns processes one at a time,
//!   streams and captures their stderr, and reports exit statuses.

/// Command splitting and process spawning.
pub mod executor;
