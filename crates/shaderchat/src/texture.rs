use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{GenericImageView, ImageFormat};
use uniforms::ImageRef;

/// Reads an image file into the `{src, width, height}` form a `sampler2D`
/// uniform accepts. The source is the untouched file as a data URI.
pub fn import_texture(path: &Path) -> Result<ImageRef> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read image at {}", path.display()))?;
    let format = image::guess_format(&bytes)
        .with_context(|| format!("unrecognised image format at {}", path.display()))?;
    let decoded = image::load_from_memory_with_format(&bytes, format)
        .with_context(|| format!("failed to decode image at {}", path.display()))?;
    let (width, height) = decoded.dimensions();
    tracing::debug!(path = %path.display(), width, height, ?format, "imported texture");

    let src = format!("data:{};base64,{}", format.to_mime_type(), STANDARD.encode(&bytes));
    Ok(ImageRef::new(src).with_size(width, height))
}
