//! Pipeline stages for image geolocation analysis.
//!
//! Each submodule implements one step. The orchestrator strings them
//! together; none of them knows about phases or observers.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ invoke ──▶ validate
//! (path/URL)  (base64)  (retry)    (report)
//!   │
//!   └──▶ gps (EXIF position → trusted location)
//! ```
//!
//! 1. [`input`]    — load a user-supplied path or URL into an image payload;
//!    [`gps`] reads the capture position from its EXIF, if any
//! 2. [`encode`]   — base64-wrap the bytes for multimodal request bodies
//! 3. [`invoke`]   — call the transport with rate-limit backoff; the only
//!    stage that sleeps
//! 4. [`validate`] — turn raw synthesis text into an
//!    [`AnalysisReport`](crate::output::AnalysisReport) or a typed error

pub mod encode;
pub mod gps;
pub mod input;
pub mod invoke;
pub mod validate;
