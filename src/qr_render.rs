//! Turns a login QR payload into an image the browser can show directly.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use qrcode::render::svg;
use qrcode::QrCode;

use crate::error_handling::types::RenderError;

const DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";

/// Renders `payload` as an SVG QR code wrapped in a `data:` URL.
pub fn to_data_url(payload: &str) -> Result<String, RenderError> {
    let code =
        QrCode::new(payload.as_bytes()).map_err(|e| RenderError::PayloadTooLong(e.to_string()))?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    Ok(format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(image)))
}
