#![no_main]

// Decode planning and stage execution against the in-memory codec, so
// geometry bugs surface without going through libjpeg-turbo.

use arbitrary::Arbitrary;
use jpeg_pipeline::engine::pipeline::fake::{stream, FakeCodec};
use jpeg_pipeline::engine::pipeline::decompress;
use jpeg_pipeline::engine::{PixelFormat, Subsampling};
use jpeg_pipeline::ops::{CropRequest, DecodeRequest, ScaleMode, ScaleRequest};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    width: u16,
    height: u16,
    subsampling: u8,
    format: u8,
    crop: Option<(u16, u16, i16, i16, bool)>,
    scale: Option<(i16, i16, u8, bool)>,
}

fuzz_target!(|input: Input| {
    let width = input.width as u32 % 300 + 1;
    let height = input.height as u32 % 300 + 1;
    let subsampling = Subsampling::ALL[input.subsampling as usize % Subsampling::ALL.len()];
    let format = PixelFormat::ALL[input.format as usize % PixelFormat::ALL.len()];

    let mut request = DecodeRequest::new(format);
    if let Some((x, y, w, h, precise)) = input.crop {
        request = request.with_crop(CropRequest {
            x: x as u32,
            y: y as u32,
            width: w as i32,
            height: h as i32,
            precise,
        });
    }
    if let Some((w, h, mode, keep_aspect)) = input.scale {
        request = request.with_scale(ScaleRequest {
            width: w as i32 % 600,
            height: h as i32 % 600,
            mode: ScaleMode::ALL[mode as usize % ScaleMode::ALL.len()],
            keep_aspect,
        });
    }

    let jpeg = stream(width, height, subsampling);
    let mut codec = FakeCodec::default();
    if let Ok(decoded) = decompress(&mut codec, &jpeg, &request, None) {
        assert!(decoded.width() >= 1 && decoded.height() >= 1);
        assert_eq!(
            decoded.length(),
            decoded.width() as usize * decoded.height() as usize * format.bytes_per_pixel()
        );
    }
});
