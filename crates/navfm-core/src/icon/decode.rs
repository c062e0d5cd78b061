//! Decoding helpers for icon image files.

use std::io::Cursor;
use std::path::Path;

use image::ImageFormat;

use crate::host::IconImage;

/// Extensions treated as "direct image" icon resources.
const DIRECT_IMAGE_EXTENSIONS: [&str; 5] = ["ico", "png", "jpg", "jpeg", "bmp"];

/// Extensions whose icon lives inside an executable or library resource.
const RESOURCE_EXTENSIONS: [&str; 2] = ["exe", "dll"];

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Returns `true` for `.ico`, `.png`, `.jpg`, `.jpeg`, `.bmp`.
pub fn is_direct_image(path: &Path) -> bool {
    extension_lower(path).is_some_and(|ext| DIRECT_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Returns `true` for `.exe` and `.dll`.
pub fn is_icon_resource(path: &Path) -> bool {
    extension_lower(path).is_some_and(|ext| RESOURCE_EXTENSIONS.contains(&ext.as_str()))
}

/// Returns `true` for files this crate can decode into a thumbnail.
pub fn is_decodable_image(path: &Path) -> bool {
    extension_lower(path).is_some_and(|ext| {
        matches!(
            ext.as_str(),
            "png" | "ico" | "bmp" | "gif" | "webp" | "tif" | "tiff"
        )
    })
}

fn encode_png(img: &image::DynamicImage) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .ok()?;
    Some(out)
}

/// Decodes `bytes` and re-encodes them as PNG.
pub fn decode_to_png(bytes: &[u8]) -> Option<Vec<u8>> {
    let img = image::load_from_memory(bytes).ok()?;
    encode_png(&img)
}

/// Decodes `bytes` and shrinks them to fit `px` x `px`, as PNG.
pub fn thumbnail_png(bytes: &[u8], px: u32) -> Option<Vec<u8>> {
    let img = image::load_from_memory(bytes).ok()?;
    encode_png(&img.thumbnail(px, px))
}

/// Turns the bytes of a direct-image icon file into an [`IconImage`].
///
/// JPEG data is passed through untouched; every other format is decoded
/// and normalised to PNG. Returns `None` for empty or undecodable input.
pub fn direct_image(bytes: &[u8]) -> Option<IconImage> {
    if bytes.is_empty() {
        return None;
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(IconImage::new(bytes.to_vec(), "image/jpeg"));
    }
    decode_to_png(bytes).map(IconImage::png)
}
