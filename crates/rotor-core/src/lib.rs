pub mod config;
pub mod error;
pub mod io;
pub mod rotation;
pub mod schedule;
pub mod state;
pub mod status;
pub mod store;

pub use error::{Result, RotorError};
