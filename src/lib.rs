//! PackStream — the binary serialization format of the Bolt graph protocol.
//!
//! A compact, self-describing wire format over a fixed value grammar: null,
//! booleans, 64-bit floats, variable-width signed integers, UTF-8 strings,
//! heterogeneous lists, string-keyed maps, and tagged structures. Every
//! value starts with a single marker byte; multi-byte fields are big-endian;
//! the packer always chooses the narrowest legal encoding.
//!
//! # Architecture
//!
//! - **`types`** — The [`Value`] grammar, the [`Int64`] integer carrier, and
//!   the inert [`Structure`] container
//! - **`pack`** — `Value` → bytes through a [`bytes::BufMut`] sink
//! - **`unpack`** — bytes → `Value` from a [`bytes::Buf`] source, with a
//!   pluggable signature → mapper registry on the [`Unpacker`]
//! - **`marker`** — The marker byte constants of the grammar
//! - **`graph`** — Typed graph structures (nodes, relationships, paths)
//!   hydrated from and dehydrated to structures
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use packstream::{pack_value, unpack_value, Value};
//!
//! let mut buf = BytesMut::new();
//! pack_value(&mut buf, &Value::from("hello")).unwrap();
//! assert_eq!(&buf[..], &[0x85, b'h', b'e', b'l', b'l', b'o']);
//!
//! let mut cursor = &buf[..];
//! assert_eq!(unpack_value(&mut cursor).unwrap(), Value::from("hello"));
//! ```

pub mod error;
pub mod graph;
pub mod marker;
pub mod pack;
pub mod types;
pub mod unpack;

pub use error::PackStreamError;
pub use pack::pack_value;
pub use types::{Int64, Structure, Value, ValueMap};
pub use unpack::{unpack_value, StructMapper, Unpacker};
