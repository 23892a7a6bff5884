//! Decoding of `confirmBatch` calldata and quorum membership events.
//!
//! Both decoders are pure: they resolve parameter types from the deployment's
//! ABI, decode with `alloy-dyn-abi` and walk the resulting `DynSolValue`
//! tree into plain structs.

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::Param;
use alloy_primitives::{Address, B256, U256};

use chainwatch_core::QuorumId;

use crate::deployment::{Deployment, CONFIRM_BATCH};
use crate::error::DecodeError;
use crate::events::EventKind;

/// A BN254 G1 point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct G1Point {
    pub x: U256,
    pub y: U256,
}

/// A BN254 G2 point (each coordinate is an Fp2 element).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct G2Point {
    pub x: [U256; 2],
    pub y: [U256; 2],
}

/// The `NonSignerStakesAndSignature` argument of `confirmBatch`.
///
/// Only `non_signer_pubkeys` feeds the metrics; the other fields are decoded
/// so that a malformed payload is rejected as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfirmationRecord {
    pub non_signer_quorum_bitmap_indices: Vec<u32>,
    pub non_signer_pubkeys: Vec<G1Point>,
    pub quorum_apks: Vec<G1Point>,
    pub apk_g2: G2Point,
    pub sigma: G1Point,
    pub quorum_apk_indices: Vec<u32>,
    pub total_stake_indices: Vec<u32>,
    pub non_signer_stake_indices: Vec<Vec<u32>>,
}

/// Payload of `OperatorAddedToQuorums` / `OperatorRemovedFromQuorums`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumChange {
    pub operator: Address,
    pub operator_id: B256,
    /// One entry per byte of `quorumNumbers`.
    pub quorums: Vec<QuorumId>,
}

/// Decode `confirmBatch` arguments (calldata without the 4-byte selector).
///
/// The first argument (the batch header) is decoded but discarded.
pub fn decode_batch_confirmation(
    deployment: &Deployment,
    args: &[u8],
) -> Result<BatchConfirmationRecord, DecodeError> {
    let func = deployment.confirm_batch().ok_or_else(|| DecodeError::MethodNotFound {
        name: CONFIRM_BATCH.to_string(),
    })?;
    let values = decode_params(&func.inputs, args)?;
    let sigs = values.get(1).ok_or(DecodeError::MissingField {
        field: "nonSignerStakesAndSignature",
    })?;
    record_from_value(sigs)
}

/// Decode the data of a quorum membership event.
pub fn decode_quorum_event(
    deployment: &Deployment,
    kind: EventKind,
    data: &[u8],
) -> Result<QuorumChange, DecodeError> {
    let event = deployment
        .registry_abi()
        .event(kind.name())
        .and_then(|events| events.first())
        .ok_or_else(|| DecodeError::EventNotFound {
            name: kind.name().to_string(),
        })?;
    let types = event
        .inputs
        .iter()
        .filter(|p| !p.indexed)
        .map(|p| p.resolve().map_err(DecodeError::abi))
        .collect::<Result<Vec<_>, _>>()?;
    let values = match DynSolType::Tuple(types).abi_decode_params(data).map_err(DecodeError::abi)? {
        DynSolValue::Tuple(values) => values,
        _ => return Err(DecodeError::TypeMismatch { field: "event data", expected: "tuple" }),
    };

    let [operator, operator_id, quorum_numbers] = values.as_slice() else {
        return Err(DecodeError::TypeMismatch {
            field: "event data",
            expected: "(address,bytes32,bytes)",
        });
    };
    let operator = match operator {
        DynSolValue::Address(a) => *a,
        _ => return Err(DecodeError::TypeMismatch { field: "operator", expected: "address" }),
    };
    let operator_id = match operator_id {
        DynSolValue::FixedBytes(word, 32) => *word,
        _ => return Err(DecodeError::TypeMismatch { field: "operatorId", expected: "bytes32" }),
    };
    let quorums = match quorum_numbers {
        DynSolValue::Bytes(b) => b.clone(),
        _ => return Err(DecodeError::TypeMismatch { field: "quorumNumbers", expected: "bytes" }),
    };
    Ok(QuorumChange {
        operator,
        operator_id,
        quorums,
    })
}

fn decode_params(inputs: &[Param], data: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
    let types = inputs
        .iter()
        .map(|p| p.resolve().map_err(DecodeError::abi))
        .collect::<Result<Vec<_>, _>>()?;
    match DynSolType::Tuple(types).abi_decode_params(data).map_err(DecodeError::abi)? {
        DynSolValue::Tuple(values) => Ok(values),
        _ => Err(DecodeError::TypeMismatch { field: "arguments", expected: "tuple" }),
    }
}

// ─── DynSolValue walking ──────────────────────────────────────────────────────

fn record_from_value(value: &DynSolValue) -> Result<BatchConfirmationRecord, DecodeError> {
    let fields = as_tuple(value, "nonSignerStakesAndSignature")?;
    let field = |i: usize, name: &'static str| fields.get(i).ok_or(DecodeError::MissingField { field: name });

    Ok(BatchConfirmationRecord {
        non_signer_quorum_bitmap_indices: u32_list(
            field(0, "nonSignerQuorumBitmapIndices")?,
            "nonSignerQuorumBitmapIndices",
        )?,
        non_signer_pubkeys: g1_list(field(1, "nonSignerPubkeys")?, "nonSignerPubkeys")?,
        quorum_apks: g1_list(field(2, "quorumApks")?, "quorumApks")?,
        apk_g2: g2(field(3, "apkG2")?)?,
        sigma: g1(field(4, "sigma")?, "sigma")?,
        quorum_apk_indices: u32_list(field(5, "quorumApkIndices")?, "quorumApkIndices")?,
        total_stake_indices: u32_list(field(6, "totalStakeIndices")?, "totalStakeIndices")?,
        non_signer_stake_indices: as_list(field(7, "nonSignerStakeIndices")?, "nonSignerStakeIndices")?
            .iter()
            .map(|inner| u32_list(inner, "nonSignerStakeIndices"))
            .collect::<Result<_, _>>()?,
    })
}

fn as_tuple<'a>(value: &'a DynSolValue, field: &'static str) -> Result<&'a [DynSolValue], DecodeError> {
    match value {
        DynSolValue::Tuple(items) => Ok(items),
        _ => Err(DecodeError::TypeMismatch { field, expected: "tuple" }),
    }
}

fn as_list<'a>(value: &'a DynSolValue, field: &'static str) -> Result<&'a [DynSolValue], DecodeError> {
    match value {
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => Ok(items),
        _ => Err(DecodeError::TypeMismatch { field, expected: "array" }),
    }
}

fn uint(value: &DynSolValue, field: &'static str) -> Result<U256, DecodeError> {
    match value {
        DynSolValue::Uint(u, _) => Ok(*u),
        _ => Err(DecodeError::TypeMismatch { field, expected: "uint" }),
    }
}

fn u32_list(value: &DynSolValue, field: &'static str) -> Result<Vec<u32>, DecodeError> {
    as_list(value, field)?
        .iter()
        .map(|v| {
            let u = uint(v, field)?;
            u32::try_from(u).map_err(|_| DecodeError::IntegerOverflow {
                field,
                value: u.to_string(),
            })
        })
        .collect()
}

fn g1(value: &DynSolValue, field: &'static str) -> Result<G1Point, DecodeError> {
    match as_tuple(value, field)? {
        [x, y] => Ok(G1Point {
            x: uint(x, field)?,
            y: uint(y, field)?,
        }),
        _ => Err(DecodeError::TypeMismatch { field, expected: "(uint256,uint256)" }),
    }
}

fn g1_list(value: &DynSolValue, field: &'static str) -> Result<Vec<G1Point>, DecodeError> {
    as_list(value, field)?.iter().map(|v| g1(v, field)).collect()
}

fn g2(value: &DynSolValue) -> Result<G2Point, DecodeError> {
    const FIELD: &str = "apkG2";
    let pair = |v: &DynSolValue| -> Result<[U256; 2], DecodeError> {
        match as_list(v, FIELD)? {
            [a, b] => Ok([uint(a, FIELD)?, uint(b, FIELD)?]),
            _ => Err(DecodeError::TypeMismatch { field: FIELD, expected: "uint256[2]" }),
        }
    };
    match as_tuple(value, FIELD)? {
        [x, y] => Ok(G2Point { x: pair(x)?, y: pair(y)? }),
        _ => Err(DecodeError::TypeMismatch { field: FIELD, expected: "(uint256[2],uint256[2])" }),
    }
}
