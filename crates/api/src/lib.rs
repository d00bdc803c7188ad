//! Client side of the MotionLab analysis service.
//!
//! Provides the async [`ApiClient`], an [`HttpTransport`] that plugs it into
//! the transfer controller, a [`DiskSink`] for downloaded files and the
//! [`SessionStore`] holding the user's access token.

pub mod client;
pub mod error;
pub mod items;
pub mod session;
pub mod sink;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::{ApiClient, UploadFile};
pub use error::ApiError;
pub use items::{download_items, video_items};
pub use session::{Session, SessionStore, TOKEN_ENV, config_dir, default_session_path};
pub use sink::DiskSink;
pub use transport::{FetchRoute, HttpTransport};
