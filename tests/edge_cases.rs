// tests/edge_cases.rs
//
// Edge case tests for jpeg-pipeline
// Tests boundary values, invalid inputs, and error handling

use jpeg_pipeline::engine::api;
use jpeg_pipeline::engine::buffer;
use jpeg_pipeline::engine::crop::{self, Rect};
use jpeg_pipeline::engine::{bytes_per_pixel, check_dimensions, PixelFormat, Subsampling};
use jpeg_pipeline::ops::{CropOptions, CropRequest, Defaults, Options, ScaleMode, ScaleOptions};
use jpeg_pipeline::{ErrorKind, PipelineError};

fn raw_options(width: u32, height: u32, format: PixelFormat) -> Options {
    Options {
        width: Some(width),
        height: Some(height),
        format: Some(format.code()),
        ..Default::default()
    }
}

mod format_codes {
    use super::*;

    #[test]
    fn test_unknown_format_codes() {
        for code in [9999, 11, -1] {
            let err = bytes_per_pixel(code).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        }
        assert_eq!(bytes_per_pixel(PixelFormat::Gray.code() as i64).unwrap(), 1);
        assert_eq!(bytes_per_pixel(PixelFormat::Bgr.code() as i64).unwrap(), 3);
        assert_eq!(bytes_per_pixel(PixelFormat::Xrgb.code() as i64).unwrap(), 4);
    }

    #[test]
    fn test_unknown_subsampling_code() {
        let options = Options {
            subsampling: Some(7),
            ..raw_options(8, 8, PixelFormat::Rgb)
        };
        let err = api::compress(&[0u8; 192], None, &options, &Defaults::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_format_code_in_options() {
        let options = Options {
            format: Some(42),
            ..Default::default()
        };
        let err = api::decompress(&[0xFF, 0xD8], None, &options, &Defaults::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }
}

mod buffers {
    use super::*;

    #[test]
    fn test_ten_byte_destination_for_thousand_byte_output() {
        let mut small = [0u8; 10];
        let err = buffer::plan(1000, Some(&mut small)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
        assert!(err.to_string().contains("1000"));
        assert!(small.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_exact_destination_is_borrowed() {
        let mut exact = vec![0u8; 48];
        let storage = buffer::plan(48, Some(&mut exact)).unwrap();
        assert!(storage.is_borrowed());
        assert_eq!(storage.len(), 48);
    }

    #[test]
    fn test_required_size_overflow() {
        let err = buffer::required_buffer_size(u32::MAX, u32::MAX, PixelFormat::Rgba);
        assert!(err.is_err());
        assert_eq!(
            buffer::required_buffer_size(3, 5, PixelFormat::Bgrx).unwrap(),
            3 * 5 * 4
        );
    }

    #[test]
    fn test_buffer_size_bounds() {
        let d = Defaults::default();
        let size = |w, h, s: Subsampling| {
            api::buffer_size(
                &Options {
                    width: Some(w),
                    height: Some(h),
                    subsampling: Some(s.code()),
                    ..Default::default()
                },
                &d,
            )
        };
        // 1x1 is still padded to a whole MCU
        assert!(size(1, 1, Subsampling::S420).unwrap() >= 16 * 16 * 3);
        assert!(size(64, 64, Subsampling::S444).unwrap() > size(64, 64, Subsampling::Gray).unwrap());
        assert_eq!(size(0, 64, Subsampling::S420).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_undersized_encode_destination() {
        let pixels = vec![0u8; 32 * 32 * 3];
        let mut out = vec![0u8; 64];
        let err = api::compress(
            &pixels,
            Some(&mut out),
            &raw_options(32, 32, PixelFormat::Rgb),
            &Defaults::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }
}

mod raw_input {
    use super::*;

    #[test]
    fn test_missing_dimensions() {
        let options = Options {
            format: Some(PixelFormat::Rgb.code()),
            ..Default::default()
        };
        let err = api::compress(&[0u8; 300], None, &options, &Defaults::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_input_smaller_than_dimensions() {
        let err = api::compress(
            &[0u8; 299],
            None,
            &raw_options(10, 10, PixelFormat::Rgb),
            &Defaults::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("Input buffer too small"));
    }

    #[test]
    fn test_quality_out_of_range() {
        for quality in [0, 101] {
            let options = Options {
                quality: Some(quality),
                ..raw_options(4, 4, PixelFormat::Gray)
            };
            let err = api::compress(&[0u8; 16], None, &options, &Defaults::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_pitch_below_width() {
        let options = Options {
            pitch: Some(3),
            ..raw_options(4, 4, PixelFormat::Gray)
        };
        let err = api::compress(&[0u8; 16], None, &options, &Defaults::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_dimension_limit() {
        let pixels = vec![0u8; 40_000];
        let err = api::crop(
            &pixels,
            None,
            &raw_options(40_000, 1, PixelFormat::Gray),
            &Defaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::DimensionExceedsLimit { .. }));
        assert!(check_dimensions(40_000, 1).is_err());
    }

    #[test]
    fn test_fast_mode_on_raw_scale() {
        let options = Options {
            scale: Some(ScaleOptions {
                width: Some(2),
                mode: Some(ScaleMode::Fast.code()),
                ..Default::default()
            }),
            ..raw_options(4, 4, PixelFormat::Gray)
        };
        let err = api::scale(&[0u8; 16], None, &options, &Defaults::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_scale_to_one_pixel() {
        let options = Options {
            scale: Some(ScaleOptions {
                width: Some(1),
                height: Some(1),
                mode: Some(ScaleMode::Bicubic.code()),
                keep_aspect: Some(false),
            }),
            ..raw_options(5, 3, PixelFormat::Rgb)
        };
        let out = api::scale(&[77u8; 45], None, &options, &Defaults::default()).unwrap();
        assert_eq!(out.pixels(), &[77, 77, 77]);
    }

    #[test]
    fn test_upscale_single_pixel() {
        let options = Options {
            scale: Some(ScaleOptions {
                width: Some(3),
                height: Some(2),
                mode: Some(ScaleMode::Bilinear.code()),
                keep_aspect: Some(false),
            }),
            ..raw_options(1, 1, PixelFormat::Gray)
        };
        let out = api::scale(&[9u8], None, &options, &Defaults::default()).unwrap();
        assert_eq!(out.pixels(), &[9u8; 6]);
    }
}

mod crop_extents {
    use super::*;

    fn request(x: u32, y: u32, width: i32, height: i32) -> CropRequest {
        CropRequest {
            x,
            y,
            width,
            height,
            precise: true,
        }
    }

    #[test]
    fn test_negative_past_near_edge_runs_to_far_edge() {
        let rect = crop::resolve(&request(2, 0, -50, 0), 10, 10).unwrap();
        assert_eq!(rect, Rect::new(2, 0, 8, 10));
    }

    #[test]
    fn test_over_long_extent_clamps() {
        let rect = crop::resolve(&request(0, 6, 4, 1000), 10, 10).unwrap();
        assert_eq!(rect, Rect::new(0, 6, 4, 4));
    }

    #[test]
    fn test_last_pixel() {
        let rect = crop::resolve(&request(9, 9, 1, 1), 10, 10).unwrap();
        assert_eq!(rect, Rect::new(9, 9, 1, 1));
        let err = crop::resolve(&request(10, 0, 1, 1), 10, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CropOutOfBounds);
    }

    #[test]
    fn test_mcu_plan_at_right_edge_is_not_block_multiple() {
        let plan = crop::plan(&request(96, 0, 0, 16), 100, 100, 16, 16).unwrap();
        assert_eq!((plan.mcu_x, plan.mcu_width), (96, 4));
        assert_eq!(plan.width, 4);
    }

    #[test]
    fn test_raw_crop_without_crop_options_copies_everything() {
        let pixels: Vec<u8> = (0..24).collect();
        let out = api::crop(
            &pixels,
            None,
            &raw_options(4, 2, PixelFormat::Rgb),
            &Defaults::default(),
        )
        .unwrap();
        assert_eq!(out.pixels(), &pixels[..]);
    }

    #[test]
    fn test_raw_crop_into_caller_buffer() {
        let pixels: Vec<u8> = (0..16).collect();
        let options = Options {
            crop: Some(CropOptions {
                x: Some(2),
                y: Some(2),
                ..Default::default()
            }),
            ..raw_options(4, 4, PixelFormat::Gray)
        };
        let mut out = [0u8; 4];
        let result = api::crop(&pixels, Some(&mut out), &options, &Defaults::default()).unwrap();
        assert!(result.storage().is_borrowed());
        drop(result);
        assert_eq!(out, [10, 11, 14, 15]);
    }
}
