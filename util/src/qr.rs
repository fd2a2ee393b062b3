//! QR codec.
//!
//! The payload is a four-field JSON object; encoding turns it into a square
//! PNG of a fixed side length and decoding parses the scanned string back.
//! Nothing here holds state.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, imageops};
use qrcode::{QrCode, types::Color};
use serde::{Deserialize, Serialize};

/// Quiet zone around the code, in modules.
const MARGIN: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("malformed QR payload: {0}")]
    MalformedPayload(String),
    #[error("QR rendering failed: {0}")]
    Render(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QrKind {
    #[serde(rename = "kelas")]
    Class,
    #[serde(rename = "kampus")]
    Campus,
    #[serde(rename = "gate")]
    Gate,
}

impl QrKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QrKind::Class => "kelas",
            QrKind::Campus => "kampus",
            QrKind::Gate => "gate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QrPayload {
    pub session_id: String,
    /// Empty when the session is not bound to a schedule.
    pub schedule_id: String,
    pub expires_at: DateTime<Utc>,
    pub kind: QrKind,
}

impl QrPayload {
    pub fn new(
        session_id: impl Into<String>,
        schedule_id: Option<String>,
        expires_at: DateTime<Utc>,
        kind: QrKind,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            schedule_id: schedule_id.unwrap_or_default(),
            expires_at,
            kind,
        }
    }

    /// Wire form embedded in the raster.
    pub fn encode(&self) -> Result<String, QrError> {
        serde_json::to_string(self).map_err(|e| QrError::Render(e.to_string()))
    }

    pub fn decode(raw: &str) -> Result<Self, QrError> {
        let payload: Self = serde_json::from_str(raw.trim())
            .map_err(|e| QrError::MalformedPayload(e.to_string()))?;
        if payload.session_id.trim().is_empty() {
            return Err(QrError::MalformedPayload("empty session_id".into()));
        }
        Ok(payload)
    }

    pub fn schedule(&self) -> Option<&str> {
        if self.schedule_id.is_empty() {
            None
        } else {
            Some(&self.schedule_id)
        }
    }
}

/// Renders `data` as a `side` × `side` grayscale PNG.
pub fn render_png(data: &str, side: u32) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| QrError::Render(e.to_string()))?;
    let module_count = code.width() as u32;
    let total = module_count + MARGIN * 2;
    let scale = (side / total).max(1);
    let image_size = total * scale;

    let mut img = ImageBuffer::from_pixel(image_size, image_size, Luma([255u8]));
    let colors = code.to_colors();

    for y in 0..module_count {
        for x in 0..module_count {
            let index = (y * module_count + x) as usize;
            if colors[index] == Color::Dark {
                let x0 = (x + MARGIN) * scale;
                let y0 = (y + MARGIN) * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(x0 + dx, y0 + dy, Luma([0u8]));
                    }
                }
            }
        }
    }

    let img = if image_size == side {
        img
    } else {
        imageops::resize(&img, side, side, imageops::FilterType::Nearest)
    };

    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| QrError::Render(e.to_string()))?;
    Ok(buf)
}

/// Renders the payload and wraps the PNG in a `data:` URL for JSON responses.
pub fn render_data_url(payload: &QrPayload, side: u32) -> Result<String, QrError> {
    let png = render_png(&payload.encode()?, side)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
