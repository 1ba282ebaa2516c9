//! Implicit graphs and level-synchronous parallel traversal.

pub mod cubic;
pub mod dense;
mod visited;

pub use cubic::{CubicAdjacency, CubicGraph};
pub use dense::{Adjacency, DenseGraph, Edge, VertexId, Weight, UNREACHABLE};
