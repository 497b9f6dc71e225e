#![no_main]

use arbitrary::Arbitrary;
use jpeg_pipeline::engine::api;
use jpeg_pipeline::ops::{CropOptions, Defaults, Options, ScaleOptions};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    width: Option<u8>,
    height: Option<u8>,
    format: u8,
    crop: (u8, u8, i8, i8),
    scale: (i8, i8, u8, bool),
    pixels: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    let base = Options {
        width: input.width.map(u32::from),
        height: input.height.map(u32::from),
        format: Some(input.format as u32 % 12),
        ..Default::default()
    };
    let defaults = Defaults::default();

    let (x, y, w, h) = input.crop;
    let crop = Options {
        crop: Some(CropOptions {
            x: Some(x as u32),
            y: Some(y as u32),
            width: Some(w as i32),
            height: Some(h as i32),
            precise: Some(true),
        }),
        ..base.clone()
    };
    let _ = api::crop(input.pixels, None, &crop, &defaults);

    let (w, h, mode, keep_aspect) = input.scale;
    let scale = Options {
        scale: Some(ScaleOptions {
            width: Some(w as i32),
            height: Some(h as i32),
            mode: Some(mode as u32 % 5),
            keep_aspect: Some(keep_aspect),
        }),
        ..base.clone()
    };
    let _ = api::scale(input.pixels, None, &scale, &defaults);

    let _ = api::compress(input.pixels, None, &base, &defaults);
});
