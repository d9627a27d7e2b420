//! `hosting-api`: thin async client for the hosting platform's site
//! management API.
//!
//! The client covers the handful of calls a rotation needs and nothing more:
//!
//! ```text
//! Client
//!   ├── create_site    POST   /sites
//!   ├── get_site       GET    /sites/{id}
//!   ├── list_sites     GET    /sites
//!   ├── list_deploys   GET    /sites/{id}/deploys   (most recent first)
//!   ├── trigger_build  POST   /sites/{id}/builds
//!   └── delete_site    DELETE /sites/{id}
//! ```
//!
//! Every request carries `Authorization: Bearer <token>`. Any non-2xx
//! response becomes [`HostingError::Api`] with the response body captured for
//! diagnostics. The client never retries; retry policy belongs to the caller.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use hosting_api::{Client, CreateSite};
//!
//! let client = Client::new("https://api.netlify.com/api/v1", token)?;
//! let site = client.create_site(&CreateSite::named("site-rotation-1")).await?;
//! println!("{}", site.public_url());
//! ```

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::{Client, DEFAULT_API_BASE};
pub use error::HostingError;
pub use types::{Build, BuildSettings, CreateSite, Deploy, RepoSource, Site};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, HostingError>;
