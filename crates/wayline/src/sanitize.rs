//! Boundary sanitizer for untrusted snapshot data.
//!
//! The engine assumes every edge it receives joins two existing nodes. This
//! module establishes that from arbitrary JSON: records that cannot be
//! repaired are dropped, everything else gets defaults.
//!
//! Field names follow the serialized form of [`Node`] and [`Edge`]; a few
//! legacy spellings (`type`, `sourceId`, `targetId`, `sourcePortIdx`,
//! `targetPortIdx`, `pathType`, `zIndex`) are accepted as well.

use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use wayline_core::{
    diagram::{BASE_Z_ORDER, Edge, Node, NodeKind, NodeShape, PortIndex, Topology},
    geometry::Point,
    identifier::Id,
};

use crate::shape::CONTROL_CHIP_SIZE;

/// A consistent set of nodes and edges.
///
/// Built by [`sanitize_snapshot`], node ids are unique and every edge joins
/// two nodes of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Snapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }
}

fn field<'a>(raw: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| raw.get(*name))
}

fn trimmed_string(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn finite_number(value: Option<&Value>) -> Option<f32> {
    value
        .and_then(Value::as_f64)
        .filter(|number| number.is_finite())
        .map(|number| number as f32)
}

/// Reads a port index from a number or numeric string, or returns `fallback`.
fn port_index(value: Option<&Value>, fallback: PortIndex) -> PortIndex {
    let number = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.fract() == 0.0 && (0.0..=3.0).contains(n))
        .and_then(|n| PortIndex::try_from(n as u8).ok())
        .unwrap_or(fallback)
}

fn parse_enum<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_value(Value::String(text.to_owned())).ok()
}

/// Repairs one raw node record, or returns `None` when it is unusable.
///
/// A node needs an object `position`; non-numeric coordinates become 0. A
/// missing id becomes `node-{index}`. An unknown `kind` drops the node, a
/// missing one means [`NodeKind::Entity`]. Control chips are always
/// rectangles and default to the compact chip size.
pub fn sanitize_node(raw: &Value, index: usize) -> Option<Node> {
    let raw = raw.as_object()?;

    let id = trimmed_string(raw.get("id"))
        .map(Id::new)
        .unwrap_or_else(|| Id::generated("node", index));

    let kind = match field(raw, &["kind", "type"]) {
        None => NodeKind::default(),
        Some(value) => match value.as_str().and_then(parse_enum::<NodeKind>) {
            Some(kind) => kind,
            None => {
                warn!(id:% = id, kind:% = value; "Dropping node with unknown kind");
                return None;
            }
        },
    };

    let Some(position) = raw.get("position").and_then(Value::as_object) else {
        warn!(id:% = id; "Dropping node without a position");
        return None;
    };
    let position = Point::new(
        finite_number(position.get("x")).unwrap_or_default(),
        finite_number(position.get("y")).unwrap_or_default(),
    );

    let shape = if kind == NodeKind::Control {
        NodeShape::Rectangle
    } else {
        raw.get("shape")
            .and_then(Value::as_str)
            .and_then(parse_enum::<NodeShape>)
            .unwrap_or_default()
    };

    let z_order = finite_number(field(raw, &["z_order", "zIndex"]))
        .map_or(BASE_Z_ORDER, |z| z as i32);

    let mut node = Node::new(id, kind, position)
        .with_shape(shape)
        .with_z_order(z_order)
        .with_locked(raw.get("locked").and_then(Value::as_bool).unwrap_or(false));
    if let Some(label) = raw.get("label").and_then(Value::as_str) {
        node = node.with_label(label);
    }

    let mut width = finite_number(raw.get("width"));
    let mut height = finite_number(raw.get("height"));
    if kind == NodeKind::Control {
        width = width.or(Some(CONTROL_CHIP_SIZE.width()));
        height = height.or(Some(CONTROL_CHIP_SIZE.height()));
    }
    node.set_size(width, height);

    Some(node)
}

/// Repairs one raw edge record, or returns `None` when it has no usable
/// endpoints.
///
/// Endpoint existence is not checked here; see [`sanitize_snapshot`].
/// Invalid port indices fall back to the right port at the source and the
/// left port at the target. Unknown topologies become Bézier.
pub fn sanitize_edge(raw: &Value, index: usize) -> Option<Edge> {
    let raw = raw.as_object()?;

    let id = trimmed_string(raw.get("id"))
        .map(Id::new)
        .unwrap_or_else(|| Id::generated("edge", index));

    let source = trimmed_string(field(raw, &["source", "sourceId"]));
    let target = trimmed_string(field(raw, &["target", "targetId"]));
    let (Some(source), Some(target)) = (source, target) else {
        warn!(id:% = id; "Dropping edge without both endpoints");
        return None;
    };

    let topology = field(raw, &["topology", "pathType"])
        .and_then(Value::as_str)
        .and_then(parse_enum::<Topology>)
        .unwrap_or_default();

    let mut edge = Edge::new(id, Id::new(source), Id::new(target))
        .with_ports(
            port_index(field(raw, &["source_port", "sourcePortIdx"]), PortIndex::Right),
            port_index(field(raw, &["target_port", "targetPortIdx"]), PortIndex::Left),
        )
        .with_topology(topology);
    if let Some(label) = raw.get("label").and_then(Value::as_str) {
        edge = edge.with_label(label);
    }

    Some(edge)
}

/// Repairs a whole snapshot.
///
/// Returns `None` unless `data` is an object with `nodes` and `edges`
/// arrays. Duplicate node and edge ids keep their first record. Edges whose
/// endpoints are not in the repaired node list are dropped.
pub fn sanitize_snapshot(data: &Value) -> Option<Snapshot> {
    let data = data.as_object()?;
    let raw_nodes = data.get("nodes")?.as_array()?;
    let raw_edges = data.get("edges")?.as_array()?;

    let mut node_ids: HashSet<Id> = HashSet::with_capacity(raw_nodes.len());
    let nodes: Vec<Node> = raw_nodes
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| sanitize_node(raw, index))
        .filter(|node| node_ids.insert(node.id()))
        .collect();

    let mut edge_ids: HashSet<Id> = HashSet::with_capacity(raw_edges.len());
    let edges: Vec<Edge> = raw_edges
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| sanitize_edge(raw, index))
        .filter(|edge| {
            let connected = node_ids.contains(&edge.source()) && node_ids.contains(&edge.target());
            if !connected {
                warn!(id:% = edge.id(); "Dropping edge with dangling endpoint");
            }
            connected
        })
        .filter(|edge| edge_ids.insert(edge.id()))
        .collect();

    debug!(
        nodes = nodes.len(),
        dropped_nodes = raw_nodes.len() - nodes.len(),
        edges = edges.len(),
        dropped_edges = raw_edges.len() - edges.len();
        "Snapshot sanitized"
    );
    Some(Snapshot::new(nodes, edges))
}
