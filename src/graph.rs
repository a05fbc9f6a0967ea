//! Typed graph structures of the hosting protocol.
//!
//! These sit on top of the generic codec: a decoded [`Value::Struct`] is
//! hydrated with `TryFrom`, and the typed forms dehydrate back into
//! [`Structure`] values for packing. Hydration tolerates the reduced arity
//! of protocol versions that predate element ids.

use crate::error::PackStreamError;
use crate::types::{Structure, Value, ValueMap};

/// Structure signature bytes for graph types.
pub mod tag {
    pub const NODE: u8 = 0x4E;
    pub const RELATIONSHIP: u8 = 0x52;
    pub const UNBOUND_RELATIONSHIP: u8 = 0x72;
    pub const PATH: u8 = 0x50;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: ValueMap,
    pub element_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: i64,
    pub start_node_id: i64,
    pub end_node_id: i64,
    pub rel_type: String,
    pub properties: ValueMap,
    pub element_id: String,
    pub start_element_id: String,
    pub end_element_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnboundRelationship {
    pub id: i64,
    pub rel_type: String,
    pub properties: ValueMap,
    pub element_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<Node>,
    pub rels: Vec<UnboundRelationship>,
    pub indices: Vec<i64>,
}

// -- Hydration --

impl TryFrom<Structure> for Node {
    type Error = PackStreamError;

    fn try_from(s: Structure) -> Result<Self, Self::Error> {
        expect_signature("Node", tag::NODE, &s)?;
        // 4 fields: id, labels, properties, element_id; older versions omit
        // the element_id.
        expect_fields("Node", &s, &[3, 4])?;
        let mut fields = s.fields.into_iter();
        let id = require_int(next_field("Node", &mut fields)?)?;
        let labels = require_string_list(next_field("Node", &mut fields)?)?;
        let properties = require_map(next_field("Node", &mut fields)?)?;
        let element_id = match fields.next() {
            Some(v) => require_string(v)?,
            None => id.to_string(),
        };
        Ok(Node {
            id,
            labels,
            properties,
            element_id,
        })
    }
}

impl TryFrom<Structure> for Relationship {
    type Error = PackStreamError;

    fn try_from(s: Structure) -> Result<Self, Self::Error> {
        expect_signature("Relationship", tag::RELATIONSHIP, &s)?;
        // 8 fields; older versions stop after properties.
        expect_fields("Relationship", &s, &[5, 8])?;
        let mut fields = s.fields.into_iter();
        let id = require_int(next_field("Relationship", &mut fields)?)?;
        let start_node_id = require_int(next_field("Relationship", &mut fields)?)?;
        let end_node_id = require_int(next_field("Relationship", &mut fields)?)?;
        let rel_type = require_string(next_field("Relationship", &mut fields)?)?;
        let properties = require_map(next_field("Relationship", &mut fields)?)?;
        let (element_id, start_element_id, end_element_id) = match fields.next() {
            Some(v) => (
                require_string(v)?,
                require_string(next_field("Relationship", &mut fields)?)?,
                require_string(next_field("Relationship", &mut fields)?)?,
            ),
            None => (
                id.to_string(),
                start_node_id.to_string(),
                end_node_id.to_string(),
            ),
        };
        Ok(Relationship {
            id,
            start_node_id,
            end_node_id,
            rel_type,
            properties,
            element_id,
            start_element_id,
            end_element_id,
        })
    }
}

impl TryFrom<Structure> for UnboundRelationship {
    type Error = PackStreamError;

    fn try_from(s: Structure) -> Result<Self, Self::Error> {
        expect_signature("UnboundRelationship", tag::UNBOUND_RELATIONSHIP, &s)?;
        expect_fields("UnboundRelationship", &s, &[3, 4])?;
        let mut fields = s.fields.into_iter();
        let id = require_int(next_field("UnboundRelationship", &mut fields)?)?;
        let rel_type = require_string(next_field("UnboundRelationship", &mut fields)?)?;
        let properties = require_map(next_field("UnboundRelationship", &mut fields)?)?;
        let element_id = match fields.next() {
            Some(v) => require_string(v)?,
            None => id.to_string(),
        };
        Ok(UnboundRelationship {
            id,
            rel_type,
            properties,
            element_id,
        })
    }
}

impl TryFrom<Structure> for Path {
    type Error = PackStreamError;

    fn try_from(s: Structure) -> Result<Self, Self::Error> {
        expect_signature("Path", tag::PATH, &s)?;
        expect_fields("Path", &s, &[3])?;
        let mut fields = s.fields.into_iter();

        let nodes = require_list(next_field("Path", &mut fields)?)?
            .into_iter()
            .map(|v| Node::try_from(require_struct(v)?))
            .collect::<Result<Vec<_>, _>>()?;

        let rels = require_list(next_field("Path", &mut fields)?)?
            .into_iter()
            .map(|v| UnboundRelationship::try_from(require_struct(v)?))
            .collect::<Result<Vec<_>, _>>()?;

        let indices = require_list(next_field("Path", &mut fields)?)?
            .into_iter()
            .map(require_int)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Path {
            nodes,
            rels,
            indices,
        })
    }
}

// -- Dehydration --

impl From<Node> for Structure {
    fn from(n: Node) -> Self {
        Structure::new(
            tag::NODE,
            vec![
                Value::from(n.id),
                Value::List(n.labels.into_iter().map(Value::from).collect()),
                Value::Map(n.properties),
                Value::String(n.element_id),
            ],
        )
    }
}

impl From<Relationship> for Structure {
    fn from(r: Relationship) -> Self {
        Structure::new(
            tag::RELATIONSHIP,
            vec![
                Value::from(r.id),
                Value::from(r.start_node_id),
                Value::from(r.end_node_id),
                Value::String(r.rel_type),
                Value::Map(r.properties),
                Value::String(r.element_id),
                Value::String(r.start_element_id),
                Value::String(r.end_element_id),
            ],
        )
    }
}

impl From<UnboundRelationship> for Structure {
    fn from(r: UnboundRelationship) -> Self {
        Structure::new(
            tag::UNBOUND_RELATIONSHIP,
            vec![
                Value::from(r.id),
                Value::String(r.rel_type),
                Value::Map(r.properties),
                Value::String(r.element_id),
            ],
        )
    }
}

impl From<Path> for Structure {
    fn from(p: Path) -> Self {
        Structure::new(
            tag::PATH,
            vec![
                Value::List(p.nodes.into_iter().map(Value::from).collect()),
                Value::List(p.rels.into_iter().map(Value::from).collect()),
                Value::List(p.indices.into_iter().map(Value::from).collect()),
            ],
        )
    }
}

impl From<Node> for Value {
    fn from(n: Node) -> Self {
        Value::Struct(Structure::from(n))
    }
}

impl From<Relationship> for Value {
    fn from(r: Relationship) -> Self {
        Value::Struct(Structure::from(r))
    }
}

impl From<UnboundRelationship> for Value {
    fn from(r: UnboundRelationship) -> Self {
        Value::Struct(Structure::from(r))
    }
}

impl From<Path> for Value {
    fn from(p: Path) -> Self {
        Value::Struct(Structure::from(p))
    }
}

// -- Field extraction helpers --

fn expect_signature(name: &str, expected: u8, s: &Structure) -> Result<(), PackStreamError> {
    if s.signature == expected {
        Ok(())
    } else {
        Err(PackStreamError::Protocol(format!(
            "expected {name} signature 0x{expected:02X}, got: 0x{:02X}",
            s.signature
        )))
    }
}

fn expect_fields(name: &str, s: &Structure, arities: &[usize]) -> Result<(), PackStreamError> {
    if arities.contains(&s.fields.len()) {
        Ok(())
    } else {
        Err(PackStreamError::Protocol(format!(
            "{name} structure has unexpected field count {}",
            s.fields.len()
        )))
    }
}

fn next_field(
    name: &str,
    fields: &mut std::vec::IntoIter<Value>,
) -> Result<Value, PackStreamError> {
    fields
        .next()
        .ok_or_else(|| PackStreamError::Protocol(format!("{name} structure is missing fields")))
}

fn require_int(v: Value) -> Result<i64, PackStreamError> {
    match v {
        Value::Integer(i) => Ok(i.as_i64()),
        other => Err(PackStreamError::Protocol(format!(
            "expected int, got: {other}"
        ))),
    }
}

fn require_string(v: Value) -> Result<String, PackStreamError> {
    match v {
        Value::String(s) => Ok(s),
        other => Err(PackStreamError::Protocol(format!(
            "expected string, got: {other}"
        ))),
    }
}

fn require_map(v: Value) -> Result<ValueMap, PackStreamError> {
    match v {
        Value::Map(m) => Ok(m),
        other => Err(PackStreamError::Protocol(format!(
            "expected map, got: {other}"
        ))),
    }
}

fn require_list(v: Value) -> Result<Vec<Value>, PackStreamError> {
    match v {
        Value::List(l) => Ok(l),
        other => Err(PackStreamError::Protocol(format!(
            "expected list, got: {other}"
        ))),
    }
}

fn require_struct(v: Value) -> Result<Structure, PackStreamError> {
    match v {
        Value::Struct(s) => Ok(s),
        other => Err(PackStreamError::Protocol(format!(
            "expected structure, got: {other}"
        ))),
    }
}

fn require_string_list(v: Value) -> Result<Vec<String>, PackStreamError> {
    match v {
        Value::List(items) => items.into_iter().map(require_string).collect(),
        other => Err(PackStreamError::Protocol(format!(
            "expected string list, got: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::pack_value;
    use crate::unpack::unpack_value;
    use bytes::BytesMut;

    fn sample_node() -> Node {
        Node {
            id: 42,
            labels: vec!["Person".into()],
            properties: ValueMap::from([("name".to_string(), Value::from("Alice"))]),
            element_id: "42".into(),
        }
    }

    fn sample_rel() -> UnboundRelationship {
        UnboundRelationship {
            id: 7,
            rel_type: "KNOWS".into(),
            properties: ValueMap::new(),
            element_id: "7".into(),
        }
    }

    /// Dehydrate, pack, unpack, hydrate.
    fn wire_round_trip<T>(value: T) -> T
    where
        T: Into<Value>,
        T: TryFrom<Structure, Error = PackStreamError>,
    {
        let mut buf = BytesMut::new();
        pack_value(&mut buf, &value.into()).expect("pack failed");
        let mut cursor = &buf[..];
        match unpack_value(&mut cursor).expect("unpack failed") {
            Value::Struct(s) => T::try_from(s).expect("hydrate failed"),
            other => panic!("expected structure, got {other}"),
        }
    }

    #[test]
    fn node_wire_round_trip() {
        let node = sample_node();
        assert_eq!(wire_round_trip(node.clone()), node);
    }

    #[test]
    fn node_without_element_id_derives_it_from_id() {
        // Older protocol versions send 3 fields.
        let s = Structure::new(
            tag::NODE,
            vec![
                Value::from(42),
                Value::List(vec![Value::from("Person")]),
                Value::Map(ValueMap::new()),
            ],
        );
        let node = Node::try_from(s).unwrap();
        assert_eq!(node.element_id, "42");
    }

    #[test]
    fn node_rejects_wrong_signature() {
        let s = Structure::new(0x52, vec![]);
        let err = Node::try_from(s).unwrap_err();
        assert!(err.to_string().contains("0x4E"), "{err}");
    }

    #[test]
    fn node_rejects_bad_field_type() {
        let s = Structure::new(
            tag::NODE,
            vec![
                Value::from("not an id"),
                Value::List(vec![]),
                Value::Map(ValueMap::new()),
            ],
        );
        let err = Node::try_from(s).unwrap_err();
        assert!(err.to_string().contains("expected int"), "{err}");
    }

    #[test]
    fn relationship_wire_round_trip() {
        let rel = Relationship {
            id: 1,
            start_node_id: 2,
            end_node_id: 3,
            rel_type: "KNOWS".into(),
            properties: ValueMap::from([("since".to_string(), Value::from(2020))]),
            element_id: "1".into(),
            start_element_id: "2".into(),
            end_element_id: "3".into(),
        };
        assert_eq!(wire_round_trip(rel.clone()), rel);
    }

    #[test]
    fn relationship_without_element_ids_derives_them() {
        let s = Structure::new(
            tag::RELATIONSHIP,
            vec![
                Value::from(1),
                Value::from(2),
                Value::from(3),
                Value::from("KNOWS"),
                Value::Map(ValueMap::new()),
            ],
        );
        let rel = Relationship::try_from(s).unwrap();
        assert_eq!(rel.element_id, "1");
        assert_eq!(rel.start_element_id, "2");
        assert_eq!(rel.end_element_id, "3");
    }

    #[test]
    fn path_wire_round_trip() {
        let path = Path {
            nodes: vec![sample_node(), Node { id: 43, ..sample_node() }],
            rels: vec![sample_rel()],
            indices: vec![1, 1],
        };
        assert_eq!(wire_round_trip(path.clone()), path);
    }

    #[test]
    fn path_rejects_non_structure_nodes() {
        let s = Structure::new(
            tag::PATH,
            vec![
                Value::List(vec![Value::from(1)]),
                Value::List(vec![]),
                Value::List(vec![]),
            ],
        );
        let err = Path::try_from(s).unwrap_err();
        assert!(err.to_string().contains("expected structure"), "{err}");
    }

    #[test]
    fn unexpected_arity_is_rejected() {
        let s = Structure::new(tag::NODE, vec![Value::from(1)]);
        let err = Node::try_from(s).unwrap_err();
        assert!(err.to_string().contains("field count"), "{err}");
    }
}
