use super::FrameBuffer;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("failed to write screenshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub fn screenshot_file_name(samples: u32) -> String {
    format!("img_{samples}.png")
}

/// Writes a bottom-up RGB buffer as a top-down PNG named after `samples`.
pub fn save_frame(frame: &FrameBuffer, samples: u32, dir: &Path) -> Result<PathBuf, ScreenshotError> {
    if !frame.is_consistent() {
        return Err(ScreenshotError::BufferSize {
            width: frame.width,
            height: frame.height,
            expected: frame.width as usize * frame.height as usize * 3,
            actual: frame.pixels.len(),
        });
    }

    let path = dir.join(screenshot_file_name(samples));
    let row = frame.width as usize * 3;
    let mut flipped = Vec::with_capacity(frame.pixels.len());
    if row > 0 {
        for line in frame.pixels.chunks_exact(row).rev() {
            flipped.extend_from_slice(line);
        }
    }

    image::save_buffer_with_format(
        &path,
        &flipped,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .map_err(|source| ScreenshotError::Write {
        path: path.clone(),
        source,
    })?;

    log::info!("Saved screenshot {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_flipped_png_named_by_sample_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut frame = FrameBuffer::new(2, 2);
        // Bottom row red, top row blue.
        frame.pixels[..6].copy_from_slice(&[255, 0, 0, 255, 0, 0]);
        frame.pixels[6..].copy_from_slice(&[0, 0, 255, 0, 0, 255]);

        let path = save_frame(&frame, 42, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "img_42.png");

        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0]);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let frame = FrameBuffer {
            width: 4,
            height: 4,
            pixels: vec![0; 5],
        };
        assert!(matches!(
            save_frame(&frame, 1, dir.path()),
            Err(ScreenshotError::BufferSize { expected: 48, .. })
        ));
    }

    #[test]
    fn missing_directory_reports_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let frame = FrameBuffer::new(1, 1);
        let err = save_frame(&frame, 3, &dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ScreenshotError::Write { .. }));
    }
}
