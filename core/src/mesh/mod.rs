//! CPU-side mesh types and generators.
//!
//! This module provides GPU-agnostic mesh data:
//!
//! - [`MeshModel`] - Positions, faces and optional attribute arrays
//! - [`MeshDataMask`] - Which attribute arrays a mesh carries
//! - Generators for common shapes (grid, cube, point cloud)

pub mod generators;
mod model;

pub use model::{Color, MeshDataMask, MeshModel, WedgeTexCoords};
