//! Minimal contract-interface support: the JSON ABI, 4-byte selectors, and
//! encoding of the static integer arguments and word-based return values the
//! city contract uses.

use serde::Deserialize;
use tiny_keccak::{Hasher, Keccak};

use crate::error::{Error, Result};
use crate::tile::U256;

const WORD: usize = 32;

// ── Hashing ──────────────────────────────────────────────────────────────────

pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(bytes);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// First four bytes of the Keccak-256 of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let h = keccak256(signature.as_bytes());
    [h[0], h[1], h[2], h[3]]
}

// ── Hex ──────────────────────────────────────────────────────────────────────

pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("0x");
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

pub fn from_hex(s: &str) -> Result<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() % 2 != 0 {
        return Err(Error::Decode(format!("odd-length hex data ({} digits)", digits.len())));
    }
    digits
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            let nibble = |c: u8| (c as char).to_digit(16);
            match (nibble(pair[0]), nibble(pair[1])) {
                (Some(hi), Some(lo)) => Ok((hi << 4 | lo) as u8),
                _ => Err(Error::Decode(format!("bad hex byte {:?}", String::from_utf8_lossy(pair)))),
            }
        })
        .collect()
}

// ── Interface JSON ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub components: Vec<Param>,
}

impl Param {
    /// Canonical type string; tuples expand to `(a,b,…)`.
    pub fn canonical(&self) -> String {
        match self.ty.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> = self.components.iter().map(Param::canonical).collect();
                format!("({}){suffix}", inner.join(","))
            }
            None => self.ty.clone(),
        }
    }

    /// Number of head words a static value of this type occupies, or `None`
    /// for dynamic types.
    fn static_words(&self) -> Option<usize> {
        if self.ty.ends_with("[]") || self.ty == "bytes" || self.ty == "string" {
            return None;
        }
        if self.ty == "tuple" {
            return self.components.iter().map(Param::static_words).sum();
        }
        Some(1)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    #[default]
    NonPayable,
    Payable,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<Param>,
    #[serde(default)]
    outputs: Vec<Param>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: StateMutability,
}

#[derive(Clone, Debug)]
pub struct AbiFunction {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub state_mutability: StateMutability,
}

/// Range of an integer ABI type: `(signed, bits)`.
fn int_type(ty: &str) -> Option<(bool, u32)> {
    let (signed, bits) = match ty.strip_prefix("uint") {
        Some(b) => (false, b),
        None => (true, ty.strip_prefix("int")?),
    };
    let bits = if bits.is_empty() { 256 } else { bits.parse().ok()? };
    (bits > 0 && bits <= 256 && bits % 8 == 0).then_some((signed, bits))
}

/// One integer argument as a big-endian word, range-checked against `ty`.
fn encode_int(ty: &str, value: i64) -> Result<[u8; 32]> {
    let (signed, bits) = int_type(ty).ok_or_else(|| Error::Abi(format!("unsupported argument type {ty}")))?;
    let in_range = if signed {
        bits >= 64 || (value >= -(1i64 << (bits - 1)) && value < (1i64 << (bits - 1)))
    } else {
        value >= 0 && (bits >= 64 || (value as u64) < (1u64 << bits))
    };
    if !in_range {
        return Err(Error::InvalidArgument(format!("{value} does not fit {ty}")));
    }
    let fill = if value < 0 { 0xff } else { 0x00 };
    let mut word = [fill; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    Ok(word)
}

impl AbiFunction {
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(Param::canonical).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature())
    }

    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }

    /// Calldata for a call whose inputs are all static integers.
    pub fn encode_call(&self, args: &[i64]) -> Result<Vec<u8>> {
        if args.len() != self.inputs.len() {
            return Err(Error::Abi(format!(
                "{} takes {} arguments, got {}",
                self.name,
                self.inputs.len(),
                args.len()
            )));
        }
        let mut data = Vec::with_capacity(4 + WORD * args.len());
        data.extend_from_slice(&self.selector());
        for (param, &arg) in self.inputs.iter().zip(args) {
            data.extend_from_slice(&encode_int(&param.ty, arg)?);
        }
        Ok(data)
    }

    /// Return data as words.  A single dynamic `uintN[]` output is unpacked
    /// to its elements; otherwise every static output (tuples flattened) is
    /// one word.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<U256>> {
        if let [only] = self.outputs.as_slice() {
            if only.ty.ends_with("[]") {
                return decode_uint_array(data);
            }
        }
        let expected: usize = self
            .outputs
            .iter()
            .map(|p| p.static_words().ok_or_else(|| Error::Abi(format!("unsupported output type {}", p.ty))))
            .sum::<Result<usize>>()?;
        let words = decode_words(data)?;
        if words.len() < expected {
            return Err(Error::Decode(format!("{} returned {} words, expected {expected}", self.name, words.len())));
        }
        Ok(words[..expected].to_vec())
    }
}

// ── Return data ──────────────────────────────────────────────────────────────

pub fn decode_words(data: &[u8]) -> Result<Vec<U256>> {
    if data.len() % WORD != 0 {
        return Err(Error::Decode(format!("return data of {} bytes is not word aligned", data.len())));
    }
    Ok(data
        .chunks_exact(WORD)
        .filter_map(U256::from_be_slice)
        .collect())
}

fn word_as_usize(w: &U256) -> Result<usize> {
    w.to_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| Error::Decode(format!("offset or length too large: {w:#x}")))
}

/// ABI-encoded `uint256[]` as the sole return value: offset, length,
/// elements.
pub fn decode_uint_array(data: &[u8]) -> Result<Vec<U256>> {
    let words = decode_words(data)?;
    let offset = words
        .first()
        .map(word_as_usize)
        .transpose()?
        .ok_or_else(|| Error::Decode("empty return data".into()))?;
    if offset % WORD != 0 {
        return Err(Error::Decode(format!("array offset {offset} is not word aligned")));
    }
    let head = offset / WORD;
    let len = words
        .get(head)
        .map(word_as_usize)
        .transpose()?
        .ok_or_else(|| Error::Decode("array length out of bounds".into()))?;
    let end = len
        .checked_add(head + 1)
        .ok_or_else(|| Error::Decode(format!("array length {len} overflows")))?;
    words
        .get(head + 1..end)
        .map(<[U256]>::to_vec)
        .ok_or_else(|| Error::Decode(format!("array of {len} elements truncated")))
}

// ── Abi ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct Abi {
    functions: Vec<AbiFunction>,
}

impl Abi {
    /// Parse a standard JSON ABI array.  Non-function entries are ignored.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let entries: Vec<Entry> = serde_json::from_str(s)?;
        let functions = entries
            .into_iter()
            .filter(|e| e.kind == "function")
            .map(|e| AbiFunction {
                name: e.name,
                inputs: e.inputs,
                outputs: e.outputs,
                state_mutability: e.state_mutability,
            })
            .collect();
        Ok(Self { functions })
    }

    pub fn function(&self, name: &str) -> Result<&AbiFunction> {
        self.functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::Abi(format!("no function {name} in contract interface")))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
