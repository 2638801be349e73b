//! Image encoding: raw bytes → base64 for JSON request bodies.
//!
//! Multimodal APIs accept images as base64 strings embedded in the request.
//! The bytes are forwarded exactly as the caller supplied them — no
//! re-encoding, resizing or format conversion happens here.

use crate::request::ImagePayload;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Base64-encode the payload bytes.
pub fn to_base64(image: &ImagePayload) -> String {
    let b64 = STANDARD.encode(&image.data);
    debug!(
        "Encoded {} image: {} bytes → {} bytes base64",
        image.mime_type,
        image.len(),
        b64.len()
    );
    b64
}

/// Wrap the payload for an `edgequake_llm` vision message.
///
/// `detail: "high"` keeps fine print (street signs, plates) legible to
/// OpenAI-style tilers.
pub fn to_image_data(image: &ImagePayload) -> ImageData {
    ImageData::new(to_base64(image), image.mime_type.as_str()).with_detail("high")
}
