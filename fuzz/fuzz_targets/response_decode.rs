#![no_main]

use libfuzzer_sys::fuzz_target;
use pim_jsonrpc::{decode_single_response, RpcError};

fuzz_target!(|data: &[u8]| {
    assert!(matches!(decode_single_response(data, None), Ok(None)));
    match decode_single_response(data, Some(1)) {
        Ok(_) | Err(RpcError::Transport(_)) | Err(RpcError::Protocol(_)) => {}
        Err(RpcError::BatchState(error)) => panic!("decoder raised batch state error {error}"),
    }
});
