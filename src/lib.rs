// Library surface shared by the binary and the integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod identity;
pub mod report;
pub mod runtime;
pub mod session;
pub mod store;
pub mod timer;
pub mod tracker;
pub mod ui;
pub mod util;

pub use error::{Error, Result};
