#![no_main]
use bin2fpgadata::config::ConvertOptions;
use bin2fpgadata::stream::encode_all;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // First bytes pick the burst length, end marker and hole.
    let burst = (usize::from(data[0] % 64) + 1) * 16;
    let end_marker = data[1] & 1 != 0;
    let hole_begin = u32::from(data[2]) * 16;
    let payload = &data[3..];

    let opts = ConvertOptions::default()
        .with_burst_length(burst)
        .with_end_marker(end_marker)
        .with_hole(hole_begin, hole_begin + 64);
    let bursts = encode_all(payload, &opts).unwrap();

    let last = bursts.last().unwrap();
    assert!(last.terminal);
    assert_eq!(last.address as usize, payload.len() / burst * burst);
    for b in &bursts {
        assert_eq!(b.hex.len(), 2 * burst);
        assert!(b.hex.bytes().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        if !b.terminal {
            assert!(!(hole_begin..hole_begin + 64).contains(&b.address));
        }
    }
});
