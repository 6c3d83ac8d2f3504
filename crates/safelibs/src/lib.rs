//! Hardened replacements for a handful of libc memory and string routines.
//!
//! The Rust API lives in the modules below; [`api`] exposes the same
//! operations as flat `safe_*` C symbols.

extern crate libc;

pub mod allocator;
pub mod api;
pub mod config;
pub mod error;
pub mod hardening;
pub mod init;
pub mod maps;
pub mod mem;
pub mod platform;
pub mod random;
pub mod string;
pub mod util;

pub use error::{Error, Result};
