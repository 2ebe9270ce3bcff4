//! The JVM's "Modified UTF-8" string codec.
//!
//! This is the only text encoding NBT uses on the wire. It differs from
//! standard UTF-8 in exactly two places:
//!
//! * `U+0000` is written as the two-byte sequence `C0 80`, never as a
//!   single zero byte.
//! * Code points above the Basic Multilingual Plane are written as a
//!   UTF-16 surrogate pair with each half encoded independently as a
//!   three-byte sequence (CESU-8), six bytes total, instead of the
//!   four-byte UTF-8 form.
//!
//! Everything in between — ASCII, two- and three-byte BMP sequences — is
//! byte-identical to UTF-8, which is what makes the borrowed fast paths
//! below possible.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Encode a string as Modified UTF-8.
///
/// Returns a borrow of the input's UTF-8 bytes whenever the two encodings
/// agree, i.e. the string contains neither NUL nor anything above the BMP.
pub fn encode(s: &str) -> Cow<'_, [u8]> {
    // NUL is the only byte a UTF-8 string can contain that re-encodes, and
    // four-byte UTF-8 sequences (lead >= 0xF0) are the only multi-byte
    // forms that do.
    if s.bytes().all(|b| b != 0x00 && b < 0xF0) {
        return Cow::Borrowed(s.as_bytes());
    }

    let mut out = Vec::with_capacity(s.len() + 4);
    for c in s.chars() {
        let cp = c as u32;
        if cp < 0x10000 {
            push_unit(&mut out, cp as u16);
        } else {
            // Surrogate decomposition, each half as a 3-byte sequence.
            let v = cp - 0x10000;
            push_unit(&mut out, 0xD800 | (v >> 10) as u16);
            push_unit(&mut out, 0xDC00 | (v & 0x3FF) as u16);
        }
    }
    Cow::Owned(out)
}

/// Encode a single UTF-16 code unit. Surrogate halves pass through here
/// unchanged; they are just 16-bit values in the 3-byte range.
fn push_unit(out: &mut Vec<u8>, u: u16) {
    match u {
        0x0000 => out.extend_from_slice(&[0xC0, 0x80]),
        0x0001..=0x007F => out.push(u as u8),
        0x0080..=0x07FF => {
            out.push(0xC0 | (u >> 6) as u8);
            out.push(0x80 | (u & 0x3F) as u8);
        }
        _ => {
            out.push(0xE0 | (u >> 12) as u8);
            out.push(0x80 | ((u >> 6) & 0x3F) as u8);
            out.push(0x80 | (u & 0x3F) as u8);
        }
    }
}

/// Decode Modified UTF-8 bytes into a string.
///
/// Enforces the sequence grammar strictly: continuation bytes must match
/// `10xxxxxx`, overlong forms are rejected (except the `C0 80` NUL form),
/// truncated sequences and leading bytes outside the one- to three-byte
/// patterns fail. Surrogate halves must pair up; a Rust string cannot
/// carry an unpaired half.
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    if bytes.is_ascii() {
        // Plain zero bytes are tolerated on decode; Java's own reader
        // accepts them as U+0000 even though its writer never emits them.
        match std::str::from_utf8(bytes) {
            Ok(s) => return Ok(Cow::Borrowed(s)),
            Err(_) => unreachable!("ascii bytes are valid utf-8"),
        }
    }

    let units = decode_units(bytes)?;

    let mut out = String::with_capacity(bytes.len());
    for r in std::char::decode_utf16(units.iter().copied()) {
        match r {
            Ok(c) => out.push(c),
            Err(e) => {
                return Err(Error::invalid_encoding(format!(
                    "unpaired surrogate {:#06x}",
                    e.unpaired_surrogate()
                )))
            }
        }
    }
    Ok(Cow::Owned(out))
}

/// Decode the byte sequence into UTF-16 code units, validating the
/// per-sequence grammar but not surrogate pairing.
fn decode_units(bytes: &[u8]) -> Result<Vec<u16>> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            0x00..=0x7F => {
                units.push(u16::from(b));
                i += 1;
            }
            0xC0..=0xDF => {
                let c1 = continuation(bytes, i, 1)?;
                let u = (u16::from(b & 0x1F) << 6) | u16::from(c1 & 0x3F);
                // The sole legal overlong form is C0 80 for NUL.
                if u < 0x80 && !(b == 0xC0 && c1 == 0x80) {
                    return Err(Error::invalid_encoding(format!(
                        "overlong 2-byte sequence at offset {i}"
                    )));
                }
                units.push(u);
                i += 2;
            }
            0xE0..=0xEF => {
                let c1 = continuation(bytes, i, 1)?;
                let c2 = continuation(bytes, i, 2)?;
                let u = (u16::from(b & 0x0F) << 12)
                    | (u16::from(c1 & 0x3F) << 6)
                    | u16::from(c2 & 0x3F);
                if u < 0x800 {
                    return Err(Error::invalid_encoding(format!(
                        "overlong 3-byte sequence at offset {i}"
                    )));
                }
                units.push(u);
                i += 3;
            }
            _ => {
                // 0x80..=0xBF (bare continuation) and 0xF0..=0xFF (4-byte
                // UTF-8 leads, which modified UTF-8 never uses).
                return Err(Error::invalid_encoding(format!(
                    "invalid leading byte {b:#04x} at offset {i}"
                )));
            }
        }
    }

    Ok(units)
}

/// Fetch the `n`th byte of the sequence starting at `start`, requiring the
/// `10xxxxxx` continuation shape.
fn continuation(bytes: &[u8], start: usize, n: usize) -> Result<u8> {
    match bytes.get(start + n) {
        None => Err(Error::invalid_encoding(format!(
            "truncated sequence at offset {start}"
        ))),
        Some(&b) if b & 0xC0 == 0x80 => Ok(b),
        Some(&b) => Err(Error::invalid_encoding(format!(
            "bad continuation byte {b:#04x} at offset {}",
            start + n
        ))),
    }
}
