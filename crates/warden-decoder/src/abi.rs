//! Strict ABI decoding
//!
//! Decodes the parameter shapes the selector table needs: addresses, 256-bit
//! integers, dynamic byte strings, and uint256 arrays. Decoding is strict: a
//! short head section, an out-of-bounds tail offset, or a truncated tail all
//! fail instead of partially decoding. Address words must be zero-padded in
//! their upper 12 bytes.

use alloy_primitives::{Address, U256};

use crate::error::{DecodeError, DecodeResult};

const WORD: usize = 32;

/// Largest dynamic length the decoder accepts, in elements or bytes.
/// Calldata beyond this is not a token transfer the engine understands.
const MAX_DYNAMIC_LEN: usize = 1 << 16;

/// ABI parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiParam {
    /// 20-byte address, left-padded to a word
    Address,
    /// Unsigned 256-bit integer
    Uint256,
    /// Dynamic array of uint256
    Uint256Array,
    /// Dynamic byte string
    Bytes,
}

impl AbiParam {
    fn is_dynamic(&self) -> bool {
        matches!(self, AbiParam::Uint256Array | AbiParam::Bytes)
    }
}

/// Decoded ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    /// An address
    Address(Address),
    /// A uint256
    Uint(U256),
    /// A uint256 array
    UintArray(Vec<U256>),
    /// A byte string
    Bytes(Vec<u8>),
}

impl AbiValue {
    /// The address, when this value is one
    pub fn as_address(&self) -> Option<Address> {
        match self {
            AbiValue::Address(address) => Some(*address),
            _ => None,
        }
    }

    /// The integer, when this value is one
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer array, when this value is one
    pub fn as_uint_array(&self) -> Option<&[U256]> {
        match self {
            AbiValue::UintArray(values) => Some(values),
            _ => None,
        }
    }
}

/// Decode an argument section (calldata after the selector) against a
/// parameter schema
pub fn decode_params(params: &[AbiParam], data: &[u8]) -> DecodeResult<Vec<AbiValue>> {
    let head_size = params.len() * WORD;
    if data.len() < head_size {
        return Err(DecodeError::malformed(format!(
            "argument section is {} bytes, schema head needs {head_size}",
            data.len()
        )));
    }

    let mut values = Vec::with_capacity(params.len());
    for (index, param) in params.iter().enumerate() {
        let word = &data[index * WORD..(index + 1) * WORD];
        let value = if param.is_dynamic() {
            let offset = word_to_usize(word)?;
            if offset < head_size || offset > data.len() {
                return Err(DecodeError::malformed(format!(
                    "tail offset {offset} out of bounds for parameter {index}"
                )));
            }
            match param {
                AbiParam::Uint256Array => AbiValue::UintArray(decode_uint_array(data, offset)?),
                AbiParam::Bytes => AbiValue::Bytes(decode_bytes(data, offset)?),
                _ => unreachable!("static param classified dynamic"),
            }
        } else {
            match param {
                AbiParam::Address => AbiValue::Address(decode_address(word)?),
                AbiParam::Uint256 => AbiValue::Uint(U256::from_be_slice(word)),
                _ => unreachable!("dynamic param classified static"),
            }
        };
        values.push(value);
    }
    Ok(values)
}

fn decode_address(word: &[u8]) -> DecodeResult<Address> {
    if word[..12].iter().any(|byte| *byte != 0) {
        return Err(DecodeError::malformed(
            "address word has non-zero padding bytes",
        ));
    }
    Ok(Address::from_slice(&word[12..]))
}

fn decode_uint_array(data: &[u8], offset: usize) -> DecodeResult<Vec<U256>> {
    let len = read_length(data, offset)?;
    let elements_start = offset + WORD;
    let elements_end = elements_start
        .checked_add(len * WORD)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| DecodeError::malformed("uint array tail truncated"))?;
    let values = data[elements_start..elements_end]
        .chunks_exact(WORD)
        .map(U256::from_be_slice)
        .collect();
    Ok(values)
}

fn decode_bytes(data: &[u8], offset: usize) -> DecodeResult<Vec<u8>> {
    let len = read_length(data, offset)?;
    let bytes_start = offset + WORD;
    let padded_len = len.div_ceil(WORD) * WORD;
    if bytes_start
        .checked_add(padded_len)
        .map_or(true, |end| end > data.len())
    {
        return Err(DecodeError::malformed("bytes tail truncated"));
    }
    Ok(data[bytes_start..bytes_start + len].to_vec())
}

fn read_length(data: &[u8], offset: usize) -> DecodeResult<usize> {
    if offset + WORD > data.len() {
        return Err(DecodeError::malformed("length word out of bounds"));
    }
    let len = word_to_usize(&data[offset..offset + WORD])?;
    if len > MAX_DYNAMIC_LEN {
        return Err(DecodeError::malformed(format!(
            "dynamic length {len} exceeds decoder limit"
        )));
    }
    Ok(len)
}

fn word_to_usize(word: &[u8]) -> DecodeResult<usize> {
    if word[..WORD - 8].iter().any(|byte| *byte != 0) {
        return Err(DecodeError::malformed("word does not fit in usize"));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[WORD - 8..]);
    let value = u64::from_be_bytes(buf);
    usize::try_from(value).map_err(|_| DecodeError::malformed("word does not fit in usize"))
}
