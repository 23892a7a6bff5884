//! Calldata and event payload builders for tests.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, B256, U256};

use crate::decode::G1Point;

fn uint(v: U256) -> DynSolValue {
    DynSolValue::Uint(v, 256)
}

fn u32_array(values: &[u32]) -> DynSolValue {
    DynSolValue::Array(values.iter().map(|v| DynSolValue::Uint(U256::from(*v), 32)).collect())
}

fn g1(p: &G1Point) -> DynSolValue {
    DynSolValue::Tuple(vec![uint(p.x), uint(p.y)])
}

/// ABI-encoded `confirmBatch` arguments (no selector) whose non-signer set is `non_signers`.
pub fn confirm_batch_args(non_signers: &[G1Point]) -> Vec<u8> {
    let header = DynSolValue::Tuple(vec![
        DynSolValue::FixedBytes(B256::repeat_byte(0xab), 32),
        DynSolValue::Bytes(vec![0, 1]),
        DynSolValue::Bytes(vec![80, 75]),
        DynSolValue::Uint(U256::from(1_234_567u64), 32),
    ]);
    let sigs = DynSolValue::Tuple(vec![
        u32_array(&vec![7; non_signers.len()]),
        DynSolValue::Array(non_signers.iter().map(g1).collect()),
        DynSolValue::Array(vec![
            g1(&G1Point { x: U256::from(11), y: U256::from(12) }),
            g1(&G1Point { x: U256::from(13), y: U256::from(14) }),
        ]),
        DynSolValue::Tuple(vec![
            DynSolValue::FixedArray(vec![uint(U256::from(21)), uint(U256::from(22))]),
            DynSolValue::FixedArray(vec![uint(U256::from(23)), uint(U256::from(24))]),
        ]),
        g1(&G1Point { x: U256::from(31), y: U256::from(32) }),
        u32_array(&[1, 2]),
        u32_array(&[3, 4]),
        DynSolValue::Array(vec![u32_array(&[5]), u32_array(&[6, 7])]),
    ]);
    DynSolValue::Tuple(vec![header, sigs]).abi_encode_params()
}

/// Full `confirmBatch` calldata: `selector ++ args`.
pub fn confirm_batch_calldata(selector: [u8; 4], non_signers: &[G1Point]) -> Vec<u8> {
    let mut input = selector.to_vec();
    input.extend(confirm_batch_args(non_signers));
    input
}

/// ABI-encoded data of a quorum membership event.
pub fn quorum_event_data(operator: Address, quorums: &[u8]) -> Vec<u8> {
    DynSolValue::Tuple(vec![
        DynSolValue::Address(operator),
        DynSolValue::FixedBytes(B256::left_padding_from(operator.as_slice()), 32),
        DynSolValue::Bytes(quorums.to_vec()),
    ])
    .abi_encode_params()
}
