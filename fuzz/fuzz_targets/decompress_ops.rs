#![no_main]

use arbitrary::Arbitrary;
use jpeg_pipeline::engine::api;
use jpeg_pipeline::ops::{CropOptions, Defaults, Options, ScaleOptions};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    format: u8,
    crop: Option<(u16, u16, i16, i16, bool)>,
    scale: Option<(i16, i16, u8, bool)>,
    out_len: Option<u16>,
    jpeg: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    let options = Options {
        format: Some(input.format as u32 % 12),
        crop: input.crop.map(|(x, y, width, height, precise)| CropOptions {
            x: Some(x as u32),
            y: Some(y as u32),
            width: Some(width as i32),
            height: Some(height as i32),
            precise: Some(precise),
        }),
        scale: input.scale.map(|(width, height, mode, keep_aspect)| ScaleOptions {
            width: Some(width as i32),
            height: Some(height as i32),
            mode: Some(mode as u32 % 5),
            keep_aspect: Some(keep_aspect),
        }),
        ..Default::default()
    };

    let mut out = input.out_len.map(|len| vec![0u8; len as usize]);
    let result = api::decompress(
        input.jpeg,
        out.as_deref_mut(),
        &options,
        &Defaults::default(),
    );
    if let Ok(decoded) = result {
        assert_eq!(
            decoded.length(),
            decoded.width() as usize * decoded.height() as usize * decoded.bytes_per_pixel()
        );
    }
});
