//! CPU-side mesh representation produced by the OBJ loader.

pub type Position = [f32; 3];
pub type TexCoord = [f32; 2];
pub type Normal = [f32; 3];

/// Non-indexed triangle mesh stored as three parallel attribute streams.
///
/// Entry `i` of every stream describes the same triangle corner, in draw
/// order, so each stream can be uploaded to its own vertex buffer and drawn
/// with `vertex_count()` vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Position>,
    pub texcoords: Vec<TexCoord>,
    pub normals: Vec<Normal>,
}

impl MeshData {
    pub fn new(positions: Vec<Position>, texcoords: Vec<TexCoord>, normals: Vec<Normal>) -> Self {
        Self {
            positions,
            texcoords,
            normals,
        }
    }

    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            texcoords: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns `true` if the streams are non-empty, equally long and hold
    /// whole triangles.
    pub fn is_valid(&self) -> bool {
        let n = self.positions.len();
        n > 0 && n % 3 == 0 && self.texcoords.len() == n && self.normals.len() == n
    }

    /// Move all corners of `other` to the end of this mesh.
    pub fn append(&mut self, mut other: MeshData) {
        self.positions.append(&mut other.positions);
        self.texcoords.append(&mut other.texcoords);
        self.normals.append(&mut other.normals);
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn texcoord_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texcoords)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }
}
