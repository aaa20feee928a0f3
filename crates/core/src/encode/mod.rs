use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};

use crate::{raster::RasterBuffer, Result};

/// Prefix of the embedded data representation used on the wire.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encodes an RGBA8 raster as PNG. Identical rasters yield identical bytes.
pub fn encode_png(raster: &RasterBuffer) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        raster.pixels(),
        raster.width(),
        raster.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Wraps PNG bytes as a `data:` URL.
pub fn to_data_url(png: &[u8]) -> String {
    let mut url = String::with_capacity(PNG_DATA_URL_PREFIX.len() + png.len() * 4 / 3 + 4);
    url.push_str(PNG_DATA_URL_PREFIX);
    STANDARD.encode_string(png, &mut url);
    url
}
