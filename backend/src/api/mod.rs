//! HTTP and logging module.
//!
//! This module provides the static data server and the log broadcaster used
//! by every pipeline step.

pub mod logs;
pub mod server;

pub use logs::*;
pub use server::{router, start_server};
