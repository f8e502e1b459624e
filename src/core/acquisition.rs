use crate::core::{CameraFrame, ImagePayload};
use crate::utils::error::{MarketError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use std::path::Path;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const CAPTURE_JPEG_QUALITY: u8 = 90;

/// 從檔案 (或已讀入的位元組) 取得影像 payload
#[derive(Debug, Clone)]
pub struct ImageAcquirer {
    max_upload_bytes: usize,
}

impl Default for ImageAcquirer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl ImageAcquirer {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self { max_upload_bytes }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub async fn from_file<P: AsRef<Path>>(&self, path: P) -> Result<ImagePayload> {
        let path = path.as_ref();
        tracing::debug!("Reading image file: {}", path.display());

        // 先看大小，避免把超大檔案整個讀進記憶體
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            MarketError::unsupported(format!("cannot read {}: {}", path.display(), e))
        })?;
        if metadata.len() > self.max_upload_bytes as u64 {
            return Err(self.too_large(metadata.len()));
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            MarketError::unsupported(format!("cannot read {}: {}", path.display(), e))
        })?;
        self.from_bytes(&bytes)
    }

    pub fn from_bytes(&self, bytes: &[u8]) -> Result<ImagePayload> {
        if bytes.is_empty() {
            return Err(MarketError::unsupported("file is empty"));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(self.too_large(bytes.len() as u64));
        }

        let format = image::guess_format(bytes)
            .map_err(|e| MarketError::unsupported(format!("not a recognised image: {}", e)))?;
        let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| {
            MarketError::unsupported(format!("could not decode {:?} image: {}", format, e))
        })?;

        tracing::debug!(
            "Accepted {:?} image {}x{} ({} bytes)",
            format,
            decoded.width(),
            decoded.height(),
            bytes.len()
        );
        Ok(ImagePayload::from_bytes(format.to_mime_type(), bytes))
    }

    fn too_large(&self, size: u64) -> MarketError {
        MarketError::unsupported(format!(
            "image is {} bytes, limit is {} bytes",
            size, self.max_upload_bytes
        ))
    }
}

/// 把相機畫面轉成 JPEG payload
pub fn encode_frame_as_jpeg(frame: &CameraFrame) -> Result<ImagePayload> {
    let image = RgbImage::from_raw(frame.width, frame.height, frame.rgb.clone()).ok_or_else(|| {
        MarketError::unsupported(format!(
            "frame buffer of {} bytes does not match {}x{}",
            frame.rgb.len(),
            frame.width,
            frame.height
        ))
    })?;

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, CAPTURE_JPEG_QUALITY)
        .encode_image(&image)
        .map_err(|e| MarketError::unsupported(format!("frame encoding failed: {}", e)))?;

    Ok(ImagePayload::from_bytes(
        ImageFormat::Jpeg.to_mime_type(),
        &bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let image = RgbImage::from_pixel(4, 3, image::Rgb([200, 40, 40]));
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_from_bytes_accepts_png() {
        let acquirer = ImageAcquirer::default();
        let payload = acquirer.from_bytes(&png_bytes()).unwrap();
        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.decode_bytes().unwrap(), png_bytes());
    }

    #[test]
    fn test_from_bytes_rejects_non_image() {
        let acquirer = ImageAcquirer::default();
        let err = acquirer.from_bytes(b"just some notes").unwrap_err();
        assert!(matches!(err, MarketError::UnsupportedInput { .. }));

        let err = acquirer.from_bytes(&[]).unwrap_err();
        assert!(matches!(err, MarketError::UnsupportedInput { .. }));
    }

    #[test]
    fn test_from_bytes_rejects_truncated_image() {
        let acquirer = ImageAcquirer::default();
        let bytes = png_bytes();
        let err = acquirer.from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, MarketError::UnsupportedInput { .. }));
    }

    #[test]
    fn test_size_cap() {
        let bytes = png_bytes();
        let acquirer = ImageAcquirer::new(bytes.len() - 1);
        let err = acquirer.from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let payload = ImageAcquirer::default().from_file(&path).await.unwrap();
        assert_eq!(payload.mime_type(), "image/png");

        let missing = ImageAcquirer::default()
            .from_file(dir.path().join("missing.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(missing, MarketError::UnsupportedInput { .. }));
    }

    #[test]
    fn test_encode_frame_as_jpeg() {
        let frame = CameraFrame {
            width: 2,
            height: 2,
            rgb: vec![10; 12],
        };
        let payload = encode_frame_as_jpeg(&frame).unwrap();
        assert_eq!(payload.mime_type(), "image/jpeg");

        let bytes = payload.decode_bytes().unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);

        let bad_frame = CameraFrame {
            width: 2,
            height: 2,
            rgb: vec![10; 5],
        };
        assert!(encode_frame_as_jpeg(&bad_frame).is_err());
    }
}
