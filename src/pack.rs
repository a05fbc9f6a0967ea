//! PackStream packing: `Value` → bytes.

use bytes::BufMut;

use crate::error::PackStreamError;
use crate::marker;
use crate::types::{Int64, Structure, Value, ValueMap};

/// Packs a `Value` into the sink, choosing the narrowest legal encoding.
///
/// Size checks run before the offending container's header is emitted, so a
/// failed pack writes no bytes for that logical value. Bytes already written
/// for earlier siblings stay in the sink; the caller must treat the stream
/// as poisoned after an error.
pub fn pack_value(buf: &mut impl BufMut, value: &Value) -> Result<(), PackStreamError> {
    match value {
        Value::Null => pack_null(buf),
        Value::Boolean(b) => pack_bool(buf, *b),
        Value::Integer(i) => pack_int(buf, *i),
        Value::Float(f) => pack_float(buf, *f),
        Value::String(s) => return pack_string(buf, s),
        Value::List(items) => return pack_list(buf, items),
        Value::Map(map) => return pack_map(buf, map),
        Value::Struct(s) => return pack_struct(buf, s),
        // The sentinel has no wire form; it degrades to Null.
        Value::Undefined => pack_null(buf),
    }
    Ok(())
}

pub fn pack_null(buf: &mut impl BufMut) {
    buf.put_u8(marker::NULL);
}

pub fn pack_bool(buf: &mut impl BufMut, value: bool) {
    buf.put_u8(if value { marker::TRUE } else { marker::FALSE });
}

/// Packs an integer using the smallest tier that admits the value.
///
/// The tier is a function of the numeric value alone; boundary comparisons
/// run in 64-bit arithmetic. The widest tier writes the two 32-bit halves,
/// high word first.
pub fn pack_int(buf: &mut impl BufMut, value: Int64) {
    let v = value.as_i64();
    if (-16..=127).contains(&v) {
        // TINY_INT: single byte
        buf.put_u8(v as u8);
    } else if i64::from(i8::MIN) <= v && v <= i64::from(i8::MAX) {
        buf.put_u8(marker::INT_8);
        buf.put_i8(v as i8);
    } else if i64::from(i16::MIN) <= v && v <= i64::from(i16::MAX) {
        buf.put_u8(marker::INT_16);
        buf.put_i16(v as i16);
    } else if i64::from(i32::MIN) <= v && v <= i64::from(i32::MAX) {
        buf.put_u8(marker::INT_32);
        buf.put_i32(v as i32);
    } else {
        buf.put_u8(marker::INT_64);
        buf.put_i32(value.high());
        buf.put_i32(value.low());
    }
}

pub fn pack_float(buf: &mut impl BufMut, value: f64) {
    buf.put_u8(marker::FLOAT_64);
    buf.put_f64(value);
}

/// Packs a string (size = UTF-8 byte length, not char count).
pub fn pack_string(buf: &mut impl BufMut, value: &str) -> Result<(), PackStreamError> {
    pack_string_header(buf, value.len())?;
    buf.put_slice(value.as_bytes());
    Ok(())
}

fn pack_string_header(buf: &mut impl BufMut, len: usize) -> Result<(), PackStreamError> {
    if len <= 15 {
        buf.put_u8(marker::TINY_STRING_NIBBLE | len as u8);
    } else if len <= 255 {
        buf.put_u8(marker::STRING_8);
        buf.put_u8(len as u8);
    } else if len <= 65535 {
        buf.put_u8(marker::STRING_16);
        buf.put_u16(len as u16);
    } else if let Ok(len32) = u32::try_from(len) {
        buf.put_u8(marker::STRING_32);
        buf.put_u32(len32);
    } else {
        return Err(PackStreamError::TooLarge {
            kind: "UTF-8 strings",
            size: len,
        });
    }
    Ok(())
}

pub fn pack_list(buf: &mut impl BufMut, items: &[Value]) -> Result<(), PackStreamError> {
    pack_list_header(buf, items.len())?;
    for item in items {
        pack_value(buf, item)?;
    }
    Ok(())
}

fn pack_list_header(buf: &mut impl BufMut, len: usize) -> Result<(), PackStreamError> {
    if len <= 15 {
        buf.put_u8(marker::TINY_LIST_NIBBLE | len as u8);
    } else if len <= 255 {
        buf.put_u8(marker::LIST_8);
        buf.put_u8(len as u8);
    } else if len <= 65535 {
        buf.put_u8(marker::LIST_16);
        buf.put_u16(len as u16);
    } else if let Ok(len32) = u32::try_from(len) {
        buf.put_u8(marker::LIST_32);
        buf.put_u32(len32);
    } else {
        return Err(PackStreamError::TooLarge {
            kind: "lists",
            size: len,
        });
    }
    Ok(())
}

/// Packs a map, dropping entries that hold the undefined sentinel.
///
/// The count is computed before the header is emitted, so the declared entry
/// count always matches the entries that follow.
pub fn pack_map(buf: &mut impl BufMut, map: &ValueMap) -> Result<(), PackStreamError> {
    let count = map
        .values()
        .filter(|v| !matches!(v, Value::Undefined))
        .count();
    pack_map_header(buf, count)?;
    for (key, value) in map {
        if matches!(value, Value::Undefined) {
            continue;
        }
        pack_string(buf, key)?;
        pack_value(buf, value)?;
    }
    Ok(())
}

fn pack_map_header(buf: &mut impl BufMut, len: usize) -> Result<(), PackStreamError> {
    if len <= 15 {
        buf.put_u8(marker::TINY_MAP_NIBBLE | len as u8);
    } else if len <= 255 {
        buf.put_u8(marker::MAP_8);
        buf.put_u8(len as u8);
    } else if len <= 65535 {
        buf.put_u8(marker::MAP_16);
        buf.put_u16(len as u16);
    } else if let Ok(len32) = u32::try_from(len) {
        buf.put_u8(marker::MAP_32);
        buf.put_u32(len32);
    } else {
        return Err(PackStreamError::TooLarge {
            kind: "maps",
            size: len,
        });
    }
    Ok(())
}

pub fn pack_struct(buf: &mut impl BufMut, s: &Structure) -> Result<(), PackStreamError> {
    pack_struct_header(buf, s.signature, s.fields.len())?;
    for field in &s.fields {
        pack_value(buf, field)?;
    }
    Ok(())
}

/// Packs a structure header: size marker, then the signature byte.
///
/// The signature byte is emitted in every tier, including the 16-bit one.
pub fn pack_struct_header(
    buf: &mut impl BufMut,
    signature: u8,
    size: usize,
) -> Result<(), PackStreamError> {
    if size <= 15 {
        buf.put_u8(marker::TINY_STRUCT_NIBBLE | size as u8);
    } else if size <= 255 {
        buf.put_u8(marker::STRUCT_8);
        buf.put_u8(size as u8);
    } else if size <= 65535 {
        buf.put_u8(marker::STRUCT_16);
        buf.put_u16(size as u16);
    } else {
        return Err(PackStreamError::TooLarge {
            kind: "structures",
            size,
        });
    }
    buf.put_u8(signature);
    Ok(())
}
