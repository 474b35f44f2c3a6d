//! Session guard and assignment lifecycle for the OpenDiary portal.

pub mod assignments;
pub mod auth;
pub mod config;
pub mod directory;
pub mod err;
pub mod io;
pub mod models;
pub mod portal;
pub mod upload;

pub use assignments::{AssignmentStore, SharedAssignments};
pub use auth::{Navigation, SessionGuard};
pub use config::PortalConfig;
pub use directory::Directory;
pub use err::{Error, Result};
pub use io::{FileStorage, MemoryStorage, SessionStorage};
pub use models::*;
pub use portal::Portal;
pub use upload::{start_upload, UploadTask};
