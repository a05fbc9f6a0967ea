//! PackStream unpacking: bytes → `Value`.

use std::collections::HashMap;

use bytes::Buf;

use crate::error::PackStreamError;
use crate::marker;
use crate::types::{Int64, Structure, Value, ValueMap};

/// A caller-registered decoder for one structure signature.
///
/// Invoked after the struct header (size and signature) has been consumed,
/// with the declared field count as the third argument. The mapper must read
/// exactly that many values from the source; its return value is used
/// verbatim.
pub type StructMapper =
    Box<dyn Fn(&Unpacker, &mut dyn Buf, usize) -> Result<Value, PackStreamError> + Send + Sync>;

/// Decodes PackStream values, dispatching tagged structures through a
/// signature → mapper registry.
///
/// Mapper registration is a one-time setup step; the registry is read-only
/// while decoding. With an empty registry every structure decodes to an
/// inert [`Structure`].
#[derive(Default)]
pub struct Unpacker {
    mappers: HashMap<u8, StructMapper>,
}

impl Unpacker {
    pub fn new() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    /// Installs a decoder for `signature`, replacing any previous one.
    pub fn register<F>(&mut self, signature: u8, mapper: F)
    where
        F: Fn(&Unpacker, &mut dyn Buf, usize) -> Result<Value, PackStreamError>
            + Send
            + Sync
            + 'static,
    {
        tracing::trace!(signature, "registered struct mapper");
        self.mappers.insert(signature, Box::new(mapper));
    }

    /// Decodes a single value, reading exactly its bytes from the source.
    pub fn unpack(&self, buf: &mut dyn Buf) -> Result<Value, PackStreamError> {
        if !buf.has_remaining() {
            return Err(PackStreamError::Protocol("unexpected end of data".into()));
        }

        let m = buf.get_u8();
        match m {
            marker::NULL => Ok(Value::Null),
            marker::FALSE => Ok(Value::Boolean(false)),
            marker::TRUE => Ok(Value::Boolean(true)),

            marker::FLOAT_64 => {
                ensure_remaining(buf, 8)?;
                Ok(Value::Float(buf.get_f64()))
            }

            // Integer markers; sign is preserved across all tiers.
            marker::INT_8 => {
                ensure_remaining(buf, 1)?;
                Ok(Value::Integer(Int64::new(i64::from(buf.get_i8()))))
            }
            marker::INT_16 => {
                ensure_remaining(buf, 2)?;
                Ok(Value::Integer(Int64::new(i64::from(buf.get_i16()))))
            }
            marker::INT_32 => {
                ensure_remaining(buf, 4)?;
                Ok(Value::Integer(Int64::new(i64::from(buf.get_i32()))))
            }
            marker::INT_64 => {
                ensure_remaining(buf, 8)?;
                let high = buf.get_i32();
                let low = buf.get_i32();
                Ok(Value::Integer(Int64::from_halves(high, low)))
            }

            // String (longer)
            marker::STRING_8 => {
                ensure_remaining(buf, 1)?;
                let len = buf.get_u8() as usize;
                unpack_string_data(buf, len)
            }
            marker::STRING_16 => {
                ensure_remaining(buf, 2)?;
                let len = buf.get_u16() as usize;
                unpack_string_data(buf, len)
            }
            marker::STRING_32 => {
                ensure_remaining(buf, 4)?;
                let len = buf.get_u32() as usize;
                unpack_string_data(buf, len)
            }

            // List (longer)
            marker::LIST_8 => {
                ensure_remaining(buf, 1)?;
                let len = buf.get_u8() as usize;
                self.unpack_list_data(buf, len)
            }
            marker::LIST_16 => {
                ensure_remaining(buf, 2)?;
                let len = buf.get_u16() as usize;
                self.unpack_list_data(buf, len)
            }
            marker::LIST_32 => {
                ensure_remaining(buf, 4)?;
                let len = buf.get_u32() as usize;
                self.unpack_list_data(buf, len)
            }

            // Map (longer)
            marker::MAP_8 => {
                ensure_remaining(buf, 1)?;
                let len = buf.get_u8() as usize;
                self.unpack_map_data(buf, len)
            }
            marker::MAP_16 => {
                ensure_remaining(buf, 2)?;
                let len = buf.get_u16() as usize;
                self.unpack_map_data(buf, len)
            }
            marker::MAP_32 => {
                ensure_remaining(buf, 4)?;
                let len = buf.get_u32() as usize;
                self.unpack_map_data(buf, len)
            }

            // Structure (longer); the signature byte follows the size.
            marker::STRUCT_8 => {
                ensure_remaining(buf, 1)?;
                let size = buf.get_u8() as usize;
                self.unpack_struct(buf, size)
            }
            marker::STRUCT_16 => {
                ensure_remaining(buf, 2)?;
                let size = buf.get_u16() as usize;
                self.unpack_struct(buf, size)
            }

            // Tiny types and the remaining ranges
            _ => {
                let high = m & 0xF0;
                let low = m & 0x0F;

                match high {
                    // TINY_STRING: 0x80..=0x8F
                    marker::TINY_STRING_NIBBLE => unpack_string_data(buf, low as usize),

                    // TINY_LIST: 0x90..=0x9F
                    marker::TINY_LIST_NIBBLE => self.unpack_list_data(buf, low as usize),

                    // TINY_MAP: 0xA0..=0xAF
                    marker::TINY_MAP_NIBBLE => self.unpack_map_data(buf, low as usize),

                    // TINY_STRUCT: 0xB0..=0xBF
                    marker::TINY_STRUCT_NIBBLE => self.unpack_struct(buf, low as usize),

                    // TINY_INT positive: 0x00..=0x7F
                    _ if m <= 0x7F => Ok(Value::Integer(Int64::new(i64::from(m)))),

                    // TINY_INT negative: 0xF0..=0xFF (-16..-1)
                    _ if m >= 0xF0 => Ok(Value::Integer(Int64::new(i64::from(m as i8)))),

                    _ => Err(PackStreamError::UnknownMarker(m)),
                }
            }
        }
    }

    fn unpack_list_data(&self, buf: &mut dyn Buf, len: usize) -> Result<Value, PackStreamError> {
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.unpack(buf)?);
        }
        Ok(Value::List(items))
    }

    fn unpack_map_data(&self, buf: &mut dyn Buf, len: usize) -> Result<Value, PackStreamError> {
        let mut map = ValueMap::with_capacity(len);
        for _ in 0..len {
            let key = match self.unpack(buf)? {
                Value::String(s) => s,
                other => {
                    return Err(PackStreamError::Protocol(format!(
                        "map key must be a string, got: {other}"
                    )));
                }
            };
            let value = self.unpack(buf)?;
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    fn unpack_struct(&self, buf: &mut dyn Buf, size: usize) -> Result<Value, PackStreamError> {
        ensure_remaining(buf, 1)?;
        let signature = buf.get_u8();

        if let Some(mapper) = self.mappers.get(&signature) {
            return mapper(self, buf, size);
        }

        let mut fields = Vec::with_capacity(size);
        for _ in 0..size {
            fields.push(self.unpack(buf)?);
        }
        Ok(Value::Struct(Structure::new(signature, fields)))
    }
}

/// Decodes a single value with an empty mapper registry.
pub fn unpack_value(buf: &mut impl Buf) -> Result<Value, PackStreamError> {
    Unpacker::new().unpack(buf)
}

fn ensure_remaining(buf: &dyn Buf, needed: usize) -> Result<(), PackStreamError> {
    if buf.remaining() < needed {
        Err(PackStreamError::Protocol(format!(
            "need {needed} bytes but only {} remaining",
            buf.remaining()
        )))
    } else {
        Ok(())
    }
}

fn unpack_string_data(buf: &mut dyn Buf, len: usize) -> Result<Value, PackStreamError> {
    ensure_remaining(buf, len)?;
    let mut data = vec![0u8; len];
    buf.copy_to_slice(&mut data);
    let s = String::from_utf8(data)
        .map_err(|e| PackStreamError::Protocol(format!("invalid UTF-8 string: {e}")))?;
    Ok(Value::String(s))
}
