#![no_main]

use libfuzzer_sys::fuzz_target;
use pim_jsonrpc::decode_batch_response;

const EXPECTED_IDS: [Option<u64>; 4] = [Some(1), None, Some(2), Some(3)];

fuzz_target!(|data: &[u8]| {
    if let Ok(slots) = decode_batch_response(data, &EXPECTED_IDS) {
        assert_eq!(slots.len(), EXPECTED_IDS.len());
        assert!(matches!(slots[1], Ok(None)));
    }
});
