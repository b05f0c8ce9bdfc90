//! Visage picking - ray to vertex correspondence
//!
//! This crate resolves a world-space ray to the closest vertex of the nearest
//! intersected triangle:
//! - [`mesh::Mesh`] - flat vertex positions plus immutable triangle topology
//! - [`raycast`] - Moller-Trumbore intersection and nearest-depth search
//! - [`resolver`] - nearest triangle, then nearest vertex (ties to lowest index)
//! - [`markers::MarkerSet`] - small octahedra standing in for annotation handles
//!
//! The mesh and the marker set implement the same [`raycast::TriangleSource`]
//! trait, so both query modes share one resolver.

pub mod markers;
pub mod mesh;
pub mod raycast;
pub mod resolver;
pub mod types;

pub use markers::{Marker, MarkerSet};
pub use mesh::{Mesh, MeshError};
pub use raycast::{ray_triangle_intersection, raycast_nearest, TriangleHit, TriangleSource};
pub use resolver::{closest_vertex, resolve};
pub use types::{PickResult, Plane, Ray, EPSILON};
