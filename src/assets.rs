//! Asset materialization: turning remote headshot URLs into local files.
//!
//! For every record with an image reference this downloads the binary,
//! recompresses it when it is over the size threshold, writes it under the
//! semester output directory with a stable content-derived filename, and
//! rewrites the record's image field to the web-servable path. A failure on
//! one record keeps its original remote URL and never aborts the run.

use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, GenericImageView};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::PipelineError;
use crate::record::OfficerRecord;

/// Images at or under this size are written as downloaded.
pub const COMPRESSION_THRESHOLD: usize = 50 * 1024;
/// JPEG re-encode quality.
pub const COMPRESSION_QUALITY: u8 = 50;
/// Maximum pixel width after recompression; smaller images are never
/// upscaled.
pub const MAX_WIDTH: u32 = 600;

/// Success/failure tally for one materialization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeOutcome {
    /// Records whose image now points at a local file.
    pub succeeded: usize,
    /// Records that kept their remote URL after a download/encode failure.
    pub failed: usize,
}

/// Downloads and localizes every record's image, in order.
///
/// `public_prefix` is the web path corresponding to `images_dir`, e.g.
/// `/fetched/officers/fa25`. Records with a blank image field are passed
/// over without counting toward the tally.
pub fn materialize(
    client: &Client,
    officers: &mut [OfficerRecord],
    images_dir: &Path,
    public_prefix: &str,
) -> MaterializeOutcome {
    let mut outcome = MaterializeOutcome::default();
    info!(total = officers.len(), "processing officer images");

    for officer in officers.iter_mut() {
        let remote = officer.image.trim().to_string();
        if remote.is_empty() {
            continue;
        }
        match materialize_one(client, &officer.name, &remote, images_dir, public_prefix) {
            Ok(local) => {
                info!(officer = %officer.name, path = %local, "image downloaded");
                officer.image = local;
                outcome.succeeded += 1;
            }
            Err(err) => {
                warn!(officer = %officer.name, error = %err, "failed to download image, keeping remote URL");
                officer.image = remote;
                outcome.failed += 1;
            }
        }
    }

    info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        "image processing completed"
    );
    outcome
}

fn materialize_one(
    client: &Client,
    name: &str,
    url: &str,
    images_dir: &Path,
    public_prefix: &str,
) -> Result<String, PipelineError> {
    let response = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .map_err(|err| PipelineError::http("image download", err))?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .bytes()
        .map_err(|err| PipelineError::http("image download body", err))?
        .to_vec();

    let ext = extension_for(content_type.as_deref(), url);
    let (bytes, ext) = compress_if_needed(bytes, &ext);
    let filename = image_filename(name, url, &ext);

    fs::write(images_dir.join(&filename), &bytes)?;
    Ok(format!("{public_prefix}/{filename}"))
}

/// Picks a file extension: content-type lookup first, then the URL's path
/// suffix, else `jpg`.
pub fn extension_for(content_type: Option<&str>, url: &str) -> String {
    if let Some(ext) = content_type.and_then(extension_from_content_type) {
        return ext.to_string();
    }
    if let Some(ext) = extension_from_url(url) {
        return ext;
    }
    "jpg".to_string()
}

fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    // Parameters like "; charset" never appear on these, but strip anyway.
    let essence = content_type.split(';').next().unwrap_or("").trim();
    match essence {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn extension_from_url(url: &str) -> Option<String> {
    // Parse so signed-URL query strings don't leak into the suffix.
    let parsed = Url::parse(url).ok()?;
    let filename = parsed.path_segments()?.next_back()?.to_string();
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "webp" | "gif" => Some(ext),
        _ => None,
    }
}

/// Builds the stable local filename for an officer's image.
///
/// Sanitized lowercase name plus an 8-hex-char prefix of
/// `sha256(name + url)`, so same-named officers and re-runs stay collision
/// free while identical inputs keep producing the identical name.
pub fn image_filename(name: &str, url: &str, ext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    let tag: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("{}_{tag}.{ext}", sanitize_name(name))
}

/// Lowercases and replaces every non-alphanumeric character with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Recompresses the image when it exceeds [`COMPRESSION_THRESHOLD`].
///
/// PNG transcodes to WebP, everything else re-encodes as JPEG at
/// [`COMPRESSION_QUALITY`]; both paths first downscale to [`MAX_WIDTH`]
/// without upscaling. Returns the final bytes and extension; decode or
/// encode trouble falls back to the original bytes with a warning.
pub fn compress_if_needed(bytes: Vec<u8>, ext: &str) -> (Vec<u8>, String) {
    let original_size = bytes.len();
    if original_size <= COMPRESSION_THRESHOLD {
        debug!(size = original_size, "image under threshold, skipping compression");
        return (bytes, ext.to_string());
    }

    let decoded = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(err) => {
            warn!(error = %err, "failed to decode image, keeping original bytes");
            return (bytes, ext.to_string());
        }
    };
    let decoded = if decoded.width() > MAX_WIDTH {
        decoded.resize(MAX_WIDTH, u32::MAX, FilterType::Lanczos3)
    } else {
        decoded
    };
    let (width, height) = decoded.dimensions();

    let encoded = if ext == "png" {
        let mut out = Vec::new();
        let rgba = decoded.to_rgba8();
        WebPEncoder::new_lossless(&mut out)
            .encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map(|()| (out, "webp".to_string()))
    } else {
        let mut out = Vec::new();
        let rgb = decoded.to_rgb8();
        JpegEncoder::new_with_quality(&mut out, COMPRESSION_QUALITY)
            .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map(|()| (out, "jpg".to_string()))
    };

    match encoded {
        Ok((out, new_ext)) => {
            info!(
                original_size,
                compressed_size = out.len(),
                "image compressed"
            );
            (out, new_ext)
        }
        Err(err) => {
            warn!(error = %err, "failed to compress image, keeping original bytes");
            (bytes, ext.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        compress_if_needed, extension_for, image_filename, sanitize_name, COMPRESSION_THRESHOLD,
        MAX_WIDTH,
    };
    use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    /// Incompressible noise so small dimensions still beat the threshold.
    fn noisy_png(width: u32, height: u32) -> Vec<u8> {
        let mut seed = 0x2545f491u32;
        let img = RgbImage::from_fn(width, height, |_, _| {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            let b = seed.to_le_bytes();
            image::Rgb([b[0], b[1], b[2]])
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .expect("encode fixture PNG");
        out
    }

    #[test]
    fn sanitizes_names_like_the_roster_expects() {
        assert_eq!(sanitize_name("Ada Lovelace"), "ada_lovelace");
        assert_eq!(sanitize_name("J. Doe-Smith"), "j__doe_smith");
        assert_eq!(sanitize_name("Zoë"), "zo_");
    }

    #[test]
    fn filenames_are_stable_for_identical_inputs() {
        let a = image_filename("Ada", "https://example.org/a.png", "png");
        let b = image_filename("Ada", "https://example.org/a.png", "png");
        assert_eq!(a, b);
        assert!(a.starts_with("ada_"));
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn filenames_change_with_name_or_url() {
        let base = image_filename("Ada", "https://example.org/a.png", "png");
        assert_ne!(base, image_filename("Ada B", "https://example.org/a.png", "png"));
        assert_ne!(base, image_filename("Ada", "https://example.org/b.png", "png"));
    }

    #[test]
    fn extension_prefers_content_type_then_url_then_jpg() {
        assert_eq!(extension_for(Some("image/png"), "https://x/y.jpg"), "png");
        assert_eq!(
            extension_for(Some("application/octet-stream"), "https://x/y.JPEG?sig=1"),
            "jpeg"
        );
        assert_eq!(extension_for(None, "https://x/y.webp"), "webp");
        assert_eq!(extension_for(None, "https://x/avatar"), "jpg");
        assert_eq!(extension_for(None, "not a url"), "jpg");
    }

    #[test]
    fn exactly_threshold_sized_images_are_not_compressed() {
        let bytes = vec![0u8; COMPRESSION_THRESHOLD];
        let (out, ext) = compress_if_needed(bytes.clone(), "jpg");
        assert_eq!(out, bytes);
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn undecodable_oversized_payloads_keep_original_bytes() {
        let bytes = vec![7u8; COMPRESSION_THRESHOLD + 1];
        let (out, ext) = compress_if_needed(bytes.clone(), "png");
        assert_eq!(out, bytes);
        assert_eq!(ext, "png");
    }

    #[test]
    fn oversized_png_transcodes_to_webp_and_downscales() {
        let png = noisy_png(800, 400);
        assert!(png.len() > COMPRESSION_THRESHOLD, "fixture must exceed threshold");
        let (out, ext) = compress_if_needed(png, "png");
        assert_eq!(ext, "webp");
        let decoded = image::load_from_memory(&out).expect("decode webp output");
        assert_eq!(decoded.dimensions().0, MAX_WIDTH);
        assert_eq!(decoded.dimensions().1, 300);
    }

    #[test]
    fn small_images_are_never_upscaled() {
        let png = noisy_png(160, 160);
        assert!(png.len() > COMPRESSION_THRESHOLD, "fixture must exceed threshold");
        let (out, ext) = compress_if_needed(png, "png");
        assert_eq!(ext, "webp");
        let decoded = image::load_from_memory(&out).expect("decode webp output");
        assert_eq!(decoded.dimensions(), (160, 160));
    }

    #[test]
    fn oversized_jpeg_stays_jpeg() {
        let png = noisy_png(700, 700);
        let decoded = image::load_from_memory(&png).expect("decode fixture");
        let mut jpeg = Vec::new();
        decoded
            .to_rgb8()
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .expect("encode fixture JPEG");
        // Random noise survives JPEG large enough to cross the threshold.
        assert!(jpeg.len() > COMPRESSION_THRESHOLD);
        let (out, ext) = compress_if_needed(jpeg, "jpg");
        assert_eq!(ext, "jpg");
        let reloaded = image::load_from_memory(&out).expect("decode jpeg output");
        assert_eq!(reloaded.dimensions().0, MAX_WIDTH);
    }
}
