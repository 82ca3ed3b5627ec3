//! Asset loading/parsers (meshes, textures, shaders).
//! Wavefront OBJ loader producing non-indexed attribute streams, with two
//! interchangeable parsing strategies.
//! RGBA8 texture decoding and GLSL source loading for the demo.

pub mod error;
pub mod mesh;
pub mod obj;
pub mod shader;
pub mod texture;

pub use error::{AssetError, AssetResult, Attribute};
pub use mesh::MeshData;
pub use obj::{LoadedMesh, MeshLoader, ObjStrategy, ParseStats};
