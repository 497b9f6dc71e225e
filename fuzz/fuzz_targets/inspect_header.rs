#![no_main]

use jpeg_pipeline::engine::api;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = api::header(data) {
        assert!(header.width > 0 && header.height > 0);
    }
});
