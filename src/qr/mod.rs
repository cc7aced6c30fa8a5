//! QR tributario: the mandated validation URL and its QR rendering.
//!
//! The QR is a presentation artifact only — it never participates in any
//! hash. The `importe` parameter uses the display (2-decimal) amount form,
//! never the hash-stripped form.

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

use crate::core::VerifactuError;

/// AEAT invoice validation page; the four query parameters are fixed.
pub const VALIDATION_BASE_URL: &str =
    "https://www2.agenciatributaria.gob.es/wlpl/TIKE-CONT/ValidarQR";

/// Build the government validation URL for a record.
///
/// `importe` must already be the display (2-decimal) amount string, e.g.
/// from [`crate::core::format_amount_for_display`].
pub fn validation_url(nif: &str, numserie: &str, fecha: &str, importe: &str) -> String {
    format!(
        "{VALIDATION_BASE_URL}?nif={}&numserie={}&fecha={}&importe={}",
        urlencoding::encode(nif),
        urlencoding::encode(numserie),
        urlencoding::encode(fecha),
        urlencoding::encode(importe),
    )
}

fn encode(url: &str) -> Result<QrCode, VerifactuError> {
    // Fixed error-correction level M so the same URL always yields the
    // same symbol
    QrCode::with_error_correction_level(url, EcLevel::M)
        .map_err(|e| VerifactuError::Serialization(format!("QR encoding error: {e}")))
}

/// Render the validation URL as an SVG document.
pub fn render_svg(url: &str) -> Result<String, VerifactuError> {
    let code = encode(url)?;
    Ok(code
        .render::<qrcode::render::svg::Color<'_>>()
        .min_dimensions(200, 200)
        .build())
}

/// Render the validation URL as a base64-encoded PNG.
pub fn render_png_base64(url: &str) -> Result<String, VerifactuError> {
    let code = encode(url)?;
    let image = code.render::<Luma<u8>>().build();
    let dynamic_image = DynamicImage::ImageLuma8(image);
    let mut buffer = Cursor::new(Vec::new());
    dynamic_image
        .write_to(&mut buffer, image::ImageOutputFormat::Png)
        .map_err(|e| VerifactuError::Serialization(format!("PNG encoding error: {e}")))?;
    Ok(general_purpose::STANDARD.encode(buffer.get_ref()))
}
