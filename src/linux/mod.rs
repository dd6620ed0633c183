//! Linux X11 support module
//!
//! Provides display enumeration, pointer queries and screen capture for
//! Linux X11 environments.

pub mod capture;
pub mod display;
pub mod pointer;

pub use capture::X11Capture;
pub use pointer::X11Pointer;
