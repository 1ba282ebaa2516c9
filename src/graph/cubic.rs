//! A cubic grid graph: side `n`, vertices `n^3`, weight-1 edges to the
//! six axis neighbors. The BFS distance from the origin to `(x, y, z)`
//! is `x + y + z`, which makes the grid a convenient traversal oracle.

use std::ops::Deref;

use super::dense::{Adjacency, DenseGraph, Edge, VertexId};

/// On-demand 6-neighborhood adjacency of a cubic grid.
pub struct CubicAdjacency {
    side: VertexId,
}

impl Adjacency for CubicAdjacency {
    fn edges(&self, vertex: VertexId) -> Vec<Edge> {
        let side = self.side;
        let (x, y, z) = to_3d(side, vertex);
        let mut edges = Vec::with_capacity(6);
        if x > 0 {
            edges.push(Edge { to: to_1d(side, x - 1, y, z), weight: 1 });
        }
        if y > 0 {
            edges.push(Edge { to: to_1d(side, x, y - 1, z), weight: 1 });
        }
        if z > 0 {
            edges.push(Edge { to: to_1d(side, x, y, z - 1), weight: 1 });
        }
        if x + 1 != side {
            edges.push(Edge { to: to_1d(side, x + 1, y, z), weight: 1 });
        }
        if y + 1 != side {
            edges.push(Edge { to: to_1d(side, x, y + 1, z), weight: 1 });
        }
        if z + 1 != side {
            edges.push(Edge { to: to_1d(side, x, y, z + 1), weight: 1 });
        }
        edges
    }
}

/// A cubic grid graph of the given side length.
pub struct CubicGraph {
    side: VertexId,
    inner: DenseGraph<CubicAdjacency>,
}

impl CubicGraph {
    /// Creates a grid with `side^3` vertices.
    pub fn new(side: VertexId) -> Self {
        assert!(side > 0, "cubic graph needs a positive side");
        Self {
            side,
            inner: DenseGraph::new(side * side * side, CubicAdjacency { side }),
        }
    }

    /// Side length.
    pub fn side(&self) -> VertexId {
        self.side
    }

    /// Flattens grid coordinates into a vertex index.
    pub fn idx_3d_to_1d(&self, x: VertexId, y: VertexId, z: VertexId) -> VertexId {
        to_1d(self.side, x, y, z)
    }

    /// Recovers grid coordinates from a vertex index.
    pub fn idx_1d_to_3d(&self, vertex: VertexId) -> (VertexId, VertexId, VertexId) {
        to_3d(self.side, vertex)
    }
}

impl Deref for CubicGraph {
    type Target = DenseGraph<CubicAdjacency>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[inline]
fn to_1d(side: VertexId, x: VertexId, y: VertexId, z: VertexId) -> VertexId {
    z * side * side + y * side + x
}

#[inline]
fn to_3d(side: VertexId, vertex: VertexId) -> (VertexId, VertexId, VertexId) {
    (vertex % side, vertex / side % side, vertex / side / side)
}
