//! Wire types shared by the MotionLab transfer client crates.
//!
//! These mirror the JSON bodies and form fields exchanged with the
//! analysis service: processing modes, result folders, file listings
//! and error bodies.

pub mod messages;
pub mod types;

pub use messages::{ApiErrorBody, FileRecord, ProcessResponse, VideoRecord};
pub use types::{AnalysisMode, ContentKind, ParseError, ResultFolder};
