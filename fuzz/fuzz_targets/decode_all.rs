#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(decoder) = qoaref::StreamDecoder::new(data) else {
        return;
    };
    let total = decoder.file_header().total_samples as usize;

    // Whole-stream and frame-by-frame decoding must agree.
    let whole = qoaref::decode_all(data);
    let mut frames = Vec::new();
    let mut failed = false;
    for frame in decoder {
        match frame {
            Ok(frame) => frames.extend_from_slice(&frame.samples),
            Err(_) => {
                failed = true;
                break;
            }
        }
    }
    match whole {
        Ok(decoded) => {
            assert!(!failed);
            assert_eq!(decoded.samples, frames);
            assert!(decoded.bytes_consumed <= data.len());
            if total > 0 && decoded.num_channels > 0 {
                assert!(decoded.samples_per_channel() <= total);
            }
        }
        Err(_) => assert!(failed),
    }
});
