//! Integration tests for the frame-to-prepared-image stages.
//!
//! Tests cover:
//! - Localizing a synthetic plate-shaped rectangle in a frame
//! - Full-frame fallback when nothing qualifies
//! - File-source replay order and exhaustion

use image::{DynamicImage, GrayImage, Luma};
use lanescan::camera::{FileSource, FileSourceConfig, FrameSource};
use lanescan::error::CameraError;
use lanescan::models::Frame;
use lanescan::{ImagePreprocessor, RegionExtractor};

/// Dark frame with one bright plate-shaped rectangle.
fn synthetic_plate_frame() -> Frame {
    let mut img = GrayImage::from_pixel(640, 480, Luma([20u8]));
    for y in 150..250 {
        for x in 100..400 {
            img.put_pixel(x, y, Luma([230u8]));
        }
    }
    Frame::new(DynamicImage::ImageLuma8(img))
}

#[test]
fn plate_shaped_rectangle_is_localized() {
    let extractor = RegionExtractor::new();
    let frame = synthetic_plate_frame();

    let region = extractor
        .extract(&frame)
        .expect("plate-shaped rectangle should qualify");

    let aspect = region.aspect_ratio();
    assert!(aspect > 2.0 && aspect < 5.0, "aspect was {aspect}");

    // The selected region must cover the rectangle's center.
    let (cx, cy) = (250u32, 200u32);
    assert!(region.x <= cx && cx < region.x + region.width);
    assert!(region.y <= cy && cy < region.y + region.height);
}

#[test]
fn featureless_frame_falls_back_to_the_full_frame() {
    let extractor = RegionExtractor::new();
    let frame = Frame::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(
        320,
        240,
        Luma([128u8]),
    )));

    let region = extractor.extract(&frame);
    assert!(region.is_none());

    // The preprocessor then works on the whole frame.
    let prepared = ImagePreprocessor::new().prepare(&frame, region.as_ref());
    assert_eq!((prepared.width(), prepared.height()), (320, 240));
}

#[tokio::test]
async fn file_source_replays_frames_in_order_until_exhausted() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let first = dir.path().join("frame-000.png");
    let second = dir.path().join("frame-001.png");
    DynamicImage::new_luma8(8, 8).save(&first)?;
    DynamicImage::new_luma8(16, 16).save(&second)?;

    let source = FileSource::new(FileSourceConfig {
        device_id: format!("file:{}", dir.path().display()),
        frames: vec![first, second],
    });
    source.start()?;

    assert_eq!(source.capture_frame().await?.width(), 8);
    assert_eq!(source.capture_frame().await?.width(), 16);

    let err = source.capture_frame().await.unwrap_err();
    assert!(matches!(err, CameraError::DeviceUnavailable(_)));
    source.stop();
    Ok(())
}
