#![no_main]

use std::num::NonZeroUsize;

use hashgrade_core::bucketizer::BinSpec;
use hashgrade_core::dataset::Dataset;
use hashgrade_core::distribution::chi_squared_uniform;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let upper = u64::from(u32::from_le_bytes([data[0], data[1], data[2], data[3]])).max(1);
    let n_bins = usize::from(u16::from_le_bytes([data[4], data[5]])).max(1);
    let Some(n_bins) = NonZeroUsize::new(n_bins) else {
        return;
    };
    let rest = &data[6..];

    let spec = BinSpec::uniform(upper, n_bins);
    let boundaries = spec.boundaries();
    assert_eq!(boundaries.len(), spec.n_bins() + 1);
    assert_eq!(boundaries[0], 0);
    assert!(boundaries.windows(2).all(|w| w[0] < w[1]));
    assert!(boundaries[boundaries.len() - 1] >= upper);

    let mut histogram = spec.histogram();
    let mut recorded = 0u64;
    for chunk in rest.chunks_exact(4) {
        let value = u64::from(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        match histogram.record(value) {
            Ok(()) => {
                recorded += 1;
                assert!(value <= upper);
            }
            Err(_) => assert!(value > upper),
        }
    }
    assert_eq!(histogram.total(), recorded);
    assert_eq!(histogram.counts().iter().sum::<u64>(), recorded);

    if let Some(fit) = chi_squared_uniform(histogram.counts()) {
        assert!(fit.chi_squared >= 0.0);
        assert!((0.0..=1.0).contains(&fit.p_value));
        assert_eq!(fit.degrees_of_freedom, spec.n_bins() - 1);
    }

    // Line splitting must never lose bytes.
    let text = String::from_utf8_lossy(rest);
    let dataset = Dataset::from_text("fuzz", &text, false);
    assert_eq!(dataset.lines().concat(), text.replace("\r\n", "\n").replace('\r', "\n"));
});
