//! GLSL source loading. Compilation is left to the graphics backend.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::error::{AssetError, AssetResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub path: PathBuf,
    pub code: String,
}

impl ShaderSource {
    pub fn load(stage: ShaderStage, path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let code = fs::read_to_string(path).map_err(|source| AssetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if code.trim().is_empty() {
            return Err(AssetError::EmptyShader {
                path: path.to_path_buf(),
            });
        }
        log::debug!("Loaded {} shader {} ({} bytes)", stage, path.display(), code.len());
        Ok(Self {
            stage,
            path: path.to_path_buf(),
            code,
        })
    }
}

/// Vertex + fragment pair making up one program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSources {
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

impl ProgramSources {
    pub fn load(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> AssetResult<Self> {
        Ok(Self {
            vertex: ShaderSource::load(ShaderStage::Vertex, vertex)?,
            fragment: ShaderSource::load(ShaderStage::Fragment, fragment)?,
        })
    }
}
