//! Fuzz target: SCD4x measurement frame decoder
//!
//! Feeds arbitrary bytes to `decode_frame` and checks:
//! - No panics under any byte sequence
//! - Only nine-byte frames can decode
//! - A decoded frame re-encodes to the same bytes
//!
//! cargo fuzz run fuzz_scd4x_frame

#![no_main]

use airmon::sensors::scd4x::{Sample, crc8, decode_frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(words) = decode_frame(data) else {
        return;
    };
    assert_eq!(data.len(), 9);

    for (word, chunk) in words.iter().zip(data.chunks_exact(3)) {
        let be = word.to_be_bytes();
        assert_eq!(&chunk[..2], &be);
        assert_eq!(chunk[2], crc8(&be));
    }

    // Conversion is total: every raw word maps to a finite value.
    let sample = Sample::from_words(words);
    assert!(sample.co2_ppm.is_finite());
    assert!(sample.temperature_c.is_finite());
    assert!(sample.humidity_pct.is_finite());
});
