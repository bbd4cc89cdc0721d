//! Alumni directory for AlumniConnect.
//!
//! This module provides:
//! - Listing approved alumni
//! - Search and batch/branch filtering
//! - Connection requests between members

mod filter;
mod service;
mod types;

pub use filter::{batches, filter_alumni, DirectoryFilter, BRANCHES};
pub use service::DirectoryService;
pub use types::{ConnectionRequest, ConnectionStatus, NewConnectionRequest};
