//! Error types shared by the asset loaders.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Which temporary pool an OBJ index refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Position => "position",
            Attribute::TexCoord => "texcoord",
            Attribute::Normal => "normal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("Malformed OBJ line {line}: {message}")]
    Format { line: usize, message: String },

    #[error(
        "Unsupported face on line {line}: expected `f p/t/n p/t/n p/t/n`. \
         Try exporting the model triangulated, with UVs and normals"
    )]
    UnsupportedFace { line: usize },

    /// Index 0 and indices past the end of the pool both land here.
    #[error("{attribute} index {index} out of range (pool has {len}) at corner {corner}")]
    IndexOutOfRange {
        attribute: Attribute,
        index: u32,
        len: usize,
        corner: usize,
    },

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<AssetError>,
    },

    #[error("Failed to decode image {}: {source}", path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture data is {actual} bytes, expected {expected} for {width}x{height} RGBA8")]
    TextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Shader source {} is empty", path.display())]
    EmptyShader { path: PathBuf },
}

impl AssetError {
    /// Attach the originating file path to a parse or remap error.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            err @ (AssetError::Open { .. } | AssetError::InFile { .. }) => err,
            other => AssetError::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping `InFile` wrappers.
    pub fn root(&self) -> &AssetError {
        match self {
            AssetError::InFile { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
