use std::collections::HashMap;

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use super::{
    plane::Plane,
    types::{InertiaTensorExt, Transform},
};
use crate::error::{PhysicsError, Result};

/// Axis-aligned bounding box used for convex bounds and mass approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bounds = Self::empty();
        for &p in points {
            bounds.extend(p);
        }
        bounds
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// One polygonal face of a convex polyhedron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Outward unit normal.
    pub normal: Vec3,
    /// Centroid of the face vertices.
    pub origin: Vec3,
    /// Vertex indices, counter-clockwise around `normal`.
    pub vertices: Vec<usize>,
    /// `neighbors[k]` shares the edge `vertices[k] -> vertices[k + 1]`.
    pub neighbors: Vec<usize>,
}

impl Face {
    pub fn plane(&self) -> Plane {
        Plane {
            origin: self.origin,
            normal: self.normal,
        }
    }
}

/// Edge shared by two faces, stored once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub start: usize,
    pub end: usize,
    pub faces: [usize; 2],
}

/// Generic convex polyhedron: vertices, face planes, face polygons and adjacency.
///
/// Serialized as its vertices and face polygons; deserializing rebuilds the
/// shape through [`ConvexShape::from_faces`], so invalid input is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ConvexHullData", try_from = "ConvexHullData")]
pub struct ConvexShape {
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    edges: Vec<Edge>,
    is_box: bool,
}

/// Plain vertex and polygon lists describing a hull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexHullData {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Vec<usize>>,
}

impl From<ConvexShape> for ConvexHullData {
    fn from(shape: ConvexShape) -> Self {
        Self {
            faces: shape.faces.into_iter().map(|face| face.vertices).collect(),
            vertices: shape.vertices,
        }
    }
}

impl TryFrom<ConvexHullData> for ConvexShape {
    type Error = PhysicsError;

    fn try_from(data: ConvexHullData) -> Result<Self> {
        ConvexShape::from_faces(data.vertices, data.faces)
    }
}

/// Smallest closed polyhedron, a tetrahedron.
const MIN_HULL_SIZE: usize = 4;

const BOX_FACES: [[usize; 4]; 6] = [
    [1, 3, 7, 5],
    [0, 4, 6, 2],
    [2, 6, 7, 3],
    [0, 1, 5, 4],
    [4, 5, 7, 6],
    [0, 2, 3, 1],
];

const BOX_NEIGHBORS: [[usize; 4]; 6] = [
    [5, 2, 4, 3],
    [3, 4, 2, 5],
    [1, 4, 0, 5],
    [5, 0, 4, 1],
    [3, 0, 2, 1],
    [1, 2, 0, 3],
];

const BOX_NORMALS: [Vec3; 6] = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];

impl ConvexShape {
    /// Local-space box centred on the origin with full edge lengths `size`.
    pub fn cuboid(size: Vec3) -> Self {
        let vertices = (0..8)
            .map(|i| {
                let corner = Vec3::new(
                    (i & 1) as f32,
                    ((i >> 1) & 1) as f32,
                    ((i >> 2) & 1) as f32,
                );
                (corner - Vec3::splat(0.5)) * size
            })
            .collect();
        let polygons = BOX_FACES.iter().map(|f| f.to_vec()).collect();
        let neighbors = BOX_NEIGHBORS.iter().map(|n| n.to_vec()).collect();
        Self::assemble(vertices, polygons, BOX_NORMALS.to_vec(), neighbors, true)
    }

    /// Builds a closed convex polyhedron from vertex positions and face polygons.
    ///
    /// Face normals are derived from the polygons and oriented away from the
    /// vertex centroid, so the input winding does not matter.
    pub fn from_faces(vertices: Vec<Vec3>, polygons: Vec<Vec<usize>>) -> Result<Self> {
        if vertices.len() < MIN_HULL_SIZE || polygons.len() < MIN_HULL_SIZE {
            return Err(PhysicsError::InvalidShape(
                "a convex polyhedron needs at least 4 vertices and 4 faces".into(),
            ));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::InvalidShape("non-finite vertex".into()));
        }

        let centroid = vertices.iter().copied().sum::<Vec3>() / vertices.len() as f32;
        let mut polygons = polygons;
        let mut normals = Vec::with_capacity(polygons.len());

        for (face, polygon) in polygons.iter_mut().enumerate() {
            if polygon.len() < 3 {
                return Err(PhysicsError::InvalidShape(format!(
                    "face {face} has fewer than 3 vertices"
                )));
            }
            if let Some(&bad) = polygon.iter().find(|&&i| i >= vertices.len()) {
                return Err(PhysicsError::InvalidShape(format!(
                    "face {face} references missing vertex {bad}"
                )));
            }

            let mut normal = newell_normal(&vertices, polygon);
            if normal.length_squared() < 1e-12 {
                return Err(PhysicsError::InvalidShape(format!(
                    "face {face} is degenerate"
                )));
            }
            normal = normal.normalize();
            let origin = polygon_center(&vertices, polygon);
            if normal.dot(origin - centroid) < 0.0 {
                normal = -normal;
                polygon.reverse();
            }
            normals.push(normal);
        }

        let neighbors = face_adjacency(&polygons)?;
        let shape = Self::assemble(vertices, polygons, normals, neighbors, false);
        shape.validate()?;
        Ok(shape)
    }

    fn assemble(
        vertices: Vec<Vec3>,
        polygons: Vec<Vec<usize>>,
        normals: Vec<Vec3>,
        neighbors: Vec<Vec<usize>>,
        is_box: bool,
    ) -> Self {
        let mut edges = Vec::new();
        let faces: Vec<Face> = polygons
            .into_iter()
            .zip(normals)
            .zip(neighbors)
            .map(|((polygon, normal), neighbors)| Face {
                normal,
                origin: polygon_center(&vertices, &polygon),
                vertices: polygon,
                neighbors,
            })
            .collect();

        for (index, face) in faces.iter().enumerate() {
            let count = face.vertices.len();
            for k in 0..count {
                let other = face.neighbors[k];
                if index < other {
                    edges.push(Edge {
                        start: face.vertices[k],
                        end: face.vertices[(k + 1) % count],
                        faces: [index, other],
                    });
                }
            }
        }

        Self {
            vertices,
            faces,
            edges,
            is_box,
        }
    }

    /// Copy of this shape mapped through `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        let vertices: Vec<Vec3> = self.vertices.iter().map(|&v| transform.apply(v)).collect();
        let faces = self
            .faces
            .iter()
            .map(|face| Face {
                normal: transform.apply_normal(face.normal),
                origin: transform.apply(face.origin),
                vertices: face.vertices.clone(),
                neighbors: face.neighbors.clone(),
            })
            .collect();

        Self {
            vertices,
            faces,
            edges: self.edges.clone(),
            is_box: self.is_box,
        }
    }

    /// Checks hull size, index consistency, neighbour arity and normal length.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() < MIN_HULL_SIZE || self.faces.len() < MIN_HULL_SIZE {
            return Err(PhysicsError::InvalidShape(format!(
                "hull has {} vertices and {} faces, needs at least {MIN_HULL_SIZE} of each",
                self.vertices.len(),
                self.faces.len()
            )));
        }
        if self.vertices.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::InvalidShape("non-finite vertex".into()));
        }
        for (index, face) in self.faces.iter().enumerate() {
            if face.vertices.len() < 3 {
                return Err(PhysicsError::InvalidShape(format!(
                    "face {index} has fewer than 3 vertices"
                )));
            }
            if face.vertices.iter().any(|&v| v >= self.vertices.len()) {
                return Err(PhysicsError::InvalidShape(format!(
                    "face {index} references a missing vertex"
                )));
            }
            if face.neighbors.len() != face.vertices.len() {
                return Err(PhysicsError::InvalidShape(format!(
                    "face {index} has {} neighbours for {} vertices",
                    face.neighbors.len(),
                    face.vertices.len()
                )));
            }
            if face.neighbors.iter().any(|&n| n >= self.faces.len() || n == index) {
                return Err(PhysicsError::InvalidShape(format!(
                    "face {index} has an invalid neighbour"
                )));
            }
            if (face.normal.length() - 1.0).abs() > 1e-3 {
                return Err(PhysicsError::InvalidShape(format!(
                    "face {index} normal is not unit length"
                )));
            }
        }
        for (index, edge) in self.edges.iter().enumerate() {
            let [left, right] = edge.faces;
            if edge.start >= self.vertices.len()
                || edge.end >= self.vertices.len()
                || left >= self.faces.len()
                || right >= self.faces.len()
                || left == right
            {
                return Err(PhysicsError::InvalidShape(format!(
                    "edge {index} references a missing vertex or face"
                )));
            }
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_box(&self) -> bool {
        self.is_box
    }

    pub fn face_plane(&self, face: usize) -> Plane {
        self.faces[face].plane()
    }

    pub fn face_polygon(&self, face: usize) -> Vec<Vec3> {
        self.faces[face]
            .vertices
            .iter()
            .map(|&i| self.vertices[i])
            .collect()
    }

    pub fn edge_segment(&self, edge: usize) -> (Vec3, Vec3) {
        let e = self.edges[edge];
        (self.vertices[e.start], self.vertices[e.end])
    }

    pub fn edge_direction(&self, edge: usize) -> Vec3 {
        let (a, b) = self.edge_segment(edge);
        (b - a).normalize_or_zero()
    }

    /// Faces whose normals are pairwise non-parallel; a box yields three.
    pub fn unique_face_axes(&self) -> Vec<usize> {
        if self.is_box {
            return vec![0, 2, 4];
        }
        let mut unique: Vec<usize> = Vec::with_capacity(self.faces.len());
        for (index, face) in self.faces.iter().enumerate() {
            let duplicate = unique
                .iter()
                .any(|&u| self.faces[u].normal.dot(face.normal).abs() > 1.0 - 1e-5);
            if !duplicate {
                unique.push(index);
            }
        }
        unique
    }

    /// Edges whose directions are pairwise non-parallel; a box yields three.
    pub fn unique_edge_axes(&self) -> Vec<usize> {
        let mut unique: Vec<usize> = Vec::with_capacity(self.edges.len());
        for index in 0..self.edges.len() {
            let direction = self.edge_direction(index);
            let duplicate = unique
                .iter()
                .any(|&u| self.edge_direction(u).dot(direction).abs() > 1.0 - 1e-5);
            if !duplicate {
                unique.push(index);
            }
        }
        unique
    }

    /// Interval covered by the vertices projected onto `axis`.
    pub fn project(&self, axis: Vec3) -> (f32, f32) {
        self.vertices
            .iter()
            .map(|v| v.dot(axis))
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p), hi.max(p)))
    }

    /// Vertex furthest along `direction`.
    pub fn support(&self, direction: Vec3) -> Vec3 {
        self.vertices
            .iter()
            .copied()
            .fold((Vec3::ZERO, f32::MIN), |(best, best_dot), v| {
                let d = v.dot(direction);
                if d > best_dot {
                    (v, d)
                } else {
                    (best, best_dot)
                }
            })
            .0
    }

    pub fn centroid(&self) -> Vec3 {
        self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len().max(1) as f32
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Approximates the inertia tensor by treating the bounds as a solid box.
    pub fn approximate_inertia(&self, mass: f32) -> Mat3 {
        Mat3::for_solid_box(self.bounds().size().max(Vec3::splat(1e-4)), mass)
    }
}

fn newell_normal(vertices: &[Vec3], polygon: &[usize]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for k in 0..polygon.len() {
        let current = vertices[polygon[k]];
        let next = vertices[polygon[(k + 1) % polygon.len()]];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

fn polygon_center(vertices: &[Vec3], polygon: &[usize]) -> Vec3 {
    polygon.iter().map(|&i| vertices[i]).sum::<Vec3>() / polygon.len().max(1) as f32
}

fn face_adjacency(polygons: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
    let mut owners: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (face, polygon) in polygons.iter().enumerate() {
        for k in 0..polygon.len() {
            let a = polygon[k];
            let b = polygon[(k + 1) % polygon.len()];
            owners.entry((a.min(b), a.max(b))).or_default().push(face);
        }
    }

    polygons
        .iter()
        .enumerate()
        .map(|(face, polygon)| {
            (0..polygon.len())
                .map(|k| {
                    let a = polygon[k];
                    let b = polygon[(k + 1) % polygon.len()];
                    let sharing = owners.get(&(a.min(b), a.max(b))).map(Vec::as_slice);
                    match sharing {
                        Some([f, g]) if *f == face => Ok(*g),
                        Some([f, g]) if *g == face => Ok(*f),
                        _ => Err(PhysicsError::InvalidShape(format!(
                            "edge {a}-{b} of face {face} is not shared by exactly two faces"
                        ))),
                    }
                })
                .collect()
        })
        .collect()
}

/// World-space copy of a body's convex shape, rebuilt only when the body moves.
#[derive(Debug, Clone)]
pub struct ConvexShapeCache {
    local: ConvexShape,
    world: ConvexShape,
    source: Transform,
}

impl ConvexShapeCache {
    pub fn new(local: ConvexShape, transform: &Transform) -> Self {
        let world = local.transformed(transform);
        Self {
            local,
            world,
            source: *transform,
        }
    }

    /// Rebuilds the world shape when `transform` differs from the cached one.
    /// Returns whether a rebuild happened.
    pub fn refresh(&mut self, transform: &Transform) -> bool {
        if self.source == *transform {
            return false;
        }
        self.world = self.local.transformed(transform);
        self.source = *transform;
        true
    }

    pub fn is_stale(&self, transform: &Transform) -> bool {
        self.source != *transform
    }

    pub fn local(&self) -> &ConvexShape {
        &self.local
    }

    pub fn world(&self) -> &ConvexShape {
        &self.world
    }

    /// Transform the world shape was last built from.
    pub fn source_transform(&self) -> &Transform {
        &self.source
    }
}
