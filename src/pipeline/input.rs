//! Input resolution: load a user-supplied path or URL into an [`ImagePayload`].
//!
//! The bytes are kept in memory and never decoded. The MIME type is sniffed
//! from the magic bytes (`image::guess_format`), with the file extension as a
//! fallback for formats the sniffer does not know (e.g. HEIC).

use crate::error::InputError;
use crate::request::ImagePayload;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory image.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ImagePayload, InputError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Build a payload from bytes already in memory.
///
/// `name` is only used for the extension fallback and error messages.
pub fn payload_from_bytes(bytes: Vec<u8>, name: &str) -> Result<ImagePayload, InputError> {
    if bytes.is_empty() {
        return Err(InputError::Empty {
            source_name: name.to_string(),
        });
    }
    let mime = sniff_mime(&bytes)
        .or_else(|| mime_from_extension(name))
        .ok_or_else(|| InputError::NotAnImage {
            source_name: name.to_string(),
            magic: bytes.iter().take(8).copied().collect(),
        })?;
    debug!("{}: {} bytes, {}", name, bytes.len(), mime);
    Ok(ImagePayload::new(bytes, mime))
}

async fn read_local(path: &Path) -> Result<ImagePayload, InputError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => InputError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => InputError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => InputError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    payload_from_bytes(bytes, &path.to_string_lossy())
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ImagePayload, InputError> {
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| InputError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            InputError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            InputError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(InputError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| InputError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let name = url_filename(url).unwrap_or_else(|| url.to_string());
    payload_from_bytes(bytes.to_vec(), &name)
}

/// Last path segment of a URL, if it looks like a file name.
fn url_filename(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    (!last.is_empty() && last.contains('.')).then(|| last.to_string())
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    let mime = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Avif => "image/avif",
        _ => return None,
    };
    Some(mime)
}

fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = PathBuf::from(name)
        .extension()?
        .to_string_lossy()
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}
