//! Wayline Core Types
//!
//! This crate provides the foundational types shared by the Wayline geometry
//! and layout engine:
//!
//! - **Geometry**: Points, sizes and bounding boxes ([`geometry`] module)
//! - **Identifiers**: String-interned node and edge ids ([`identifier::Id`])
//! - **Diagram records**: Nodes, edges, ports and the viewport ([`diagram`] module)

pub mod diagram;
pub mod geometry;
pub mod identifier;
