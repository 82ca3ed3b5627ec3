//! Wavefront OBJ loader producing non-indexed triangle streams.
//!
//! Parsing fills three temporary pools (`v`, `vt`, `vn`) and three index
//! sequences (one entry per face corner). The shared remap pass then expands
//! the indices into [`MeshData`] in face-then-corner order. Two interchangeable
//! parsers exist, see [`ObjStrategy`].

mod lines;
mod tokens;

use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    str::FromStr,
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::{
    error::{AssetError, AssetResult, Attribute},
    mesh::{MeshData, Normal, Position, TexCoord},
};

pub use lines::LineLoader;
pub use tokens::TokenLoader;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Which parser turns OBJ text into [`ObjData`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObjStrategy {
    /// Read whole lines and split them on whitespace. Tolerates trailing
    /// comments and loose formatting.
    Lines,
    /// Pull whitespace-delimited tokens straight from the buffered stream.
    /// Faces must be exactly `p/t/n p/t/n p/t/n`.
    #[default]
    Tokens,
}

impl ObjStrategy {
    pub const ALL: [ObjStrategy; 2] = [ObjStrategy::Lines, ObjStrategy::Tokens];

    pub fn name(self) -> &'static str {
        match self {
            ObjStrategy::Lines => "lines",
            ObjStrategy::Tokens => "tokens",
        }
    }

    pub fn loader(self) -> &'static dyn MeshLoader {
        match self {
            ObjStrategy::Lines => &LineLoader,
            ObjStrategy::Tokens => &TokenLoader,
        }
    }
}

impl fmt::Display for ObjStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown OBJ strategy '{0}' (expected 'lines' or 'tokens')")]
pub struct UnknownStrategy(pub String);

impl FromStr for ObjStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lines" | "line" => Ok(ObjStrategy::Lines),
            "tokens" | "token" => Ok(ObjStrategy::Tokens),
            _ => Err(UnknownStrategy(s.to_owned())),
        }
    }
}

/// A parser for the OBJ subset understood by this crate.
pub trait MeshLoader: Sync {
    fn strategy(&self) -> ObjStrategy;

    /// Fill the temporary pools and index sequences from `reader`.
    fn parse(&self, reader: &mut dyn BufRead) -> AssetResult<ObjData>;
}

/// Raw parse result: attribute pools in file order plus 1-based indices,
/// one per face corner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjData {
    pub positions: Vec<Position>,
    pub texcoords: Vec<TexCoord>,
    pub normals: Vec<Normal>,
    pub position_indices: Vec<u32>,
    pub texcoord_indices: Vec<u32>,
    pub normal_indices: Vec<u32>,
    /// Lines whose tag is not `v`, `vt`, `vn` or `f`.
    pub ignored_lines: usize,
}

impl ObjData {
    /// Append a triangle given as three `[position, texcoord, normal]` corners.
    pub fn push_face(&mut self, corners: [[u32; 3]; 3]) {
        for [p, t, n] in corners {
            self.position_indices.push(p);
            self.texcoord_indices.push(t);
            self.normal_indices.push(n);
        }
    }

    pub fn face_count(&self) -> usize {
        self.position_indices.len() / 3
    }

    /// Expand the per-corner indices into draw-order attribute streams.
    pub fn remap(&self) -> AssetResult<MeshData> {
        let corners = self.position_indices.len();
        debug_assert_eq!(corners, self.texcoord_indices.len());
        debug_assert_eq!(corners, self.normal_indices.len());

        let mut mesh = MeshData::with_capacity(corners);
        let lockstep = self
            .position_indices
            .iter()
            .zip(&self.texcoord_indices)
            .zip(&self.normal_indices);
        for (corner, ((&p, &t), &n)) in lockstep.enumerate() {
            mesh.positions
                .push(lookup(&self.positions, p, Attribute::Position, corner)?);
            mesh.texcoords
                .push(lookup(&self.texcoords, t, Attribute::TexCoord, corner)?);
            mesh.normals
                .push(lookup(&self.normals, n, Attribute::Normal, corner)?);
        }
        Ok(mesh)
    }
}

fn lookup<T: Copy>(pool: &[T], index: u32, attribute: Attribute, corner: usize) -> AssetResult<T> {
    index
        .checked_sub(1)
        .and_then(|i| pool.get(i as usize))
        .copied()
        .ok_or(AssetError::IndexOutOfRange {
            attribute,
            index,
            len: pool.len(),
            corner,
        })
}

/// Counters and timings gathered while loading one mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParseStats {
    pub strategy: ObjStrategy,
    pub positions: usize,
    pub texcoords: usize,
    pub normals: usize,
    pub faces: usize,
    pub ignored_lines: usize,
    pub parse_time: Duration,
    pub remap_time: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadedMesh {
    pub mesh: MeshData,
    pub stats: ParseStats,
}

/// Load an OBJ mesh from a file path with the default strategy.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> AssetResult<MeshData> {
    load_obj_with(path, ObjStrategy::default()).map(|loaded| loaded.mesh)
}

/// Load an OBJ mesh with an explicit strategy, returning timing stats too.
pub fn load_obj_with(path: impl AsRef<Path>, strategy: ObjStrategy) -> AssetResult<LoadedMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let loaded = load(&mut reader, strategy).map_err(|e| e.in_file(path))?;

    let stats = &loaded.stats;
    log::info!(
        "Parsed {} using {} in {:.3?} (remap {:.3?}): {} triangles",
        path.display(),
        stats.strategy,
        stats.parse_time,
        stats.remap_time,
        stats.faces
    );
    Ok(loaded)
}

/// Load into caller-owned streams. On error `out` is left untouched.
pub fn load_obj_into(
    path: impl AsRef<Path>,
    strategy: ObjStrategy,
    out: &mut MeshData,
) -> AssetResult<ParseStats> {
    let loaded = load_obj_with(path, strategy)?;
    out.append(loaded.mesh);
    Ok(loaded.stats)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(mut reader: R, strategy: ObjStrategy) -> AssetResult<LoadedMesh> {
    load(&mut reader, strategy)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str, strategy: ObjStrategy) -> AssetResult<LoadedMesh> {
    load(&mut io::Cursor::new(contents), strategy)
}

fn load(reader: &mut dyn BufRead, strategy: ObjStrategy) -> AssetResult<LoadedMesh> {
    let loader = strategy.loader();
    let start = Instant::now();
    let data = loader.parse(reader)?;
    let parse_time = start.elapsed();

    let start = Instant::now();
    let mesh = data.remap()?;
    let remap_time = start.elapsed();

    if data.ignored_lines > 0 {
        log::debug!("Ignored {} unsupported OBJ lines", data.ignored_lines);
    }

    let stats = ParseStats {
        strategy: loader.strategy(),
        positions: data.positions.len(),
        texcoords: data.texcoords.len(),
        normals: data.normals.len(),
        faces: data.face_count(),
        ignored_lines: data.ignored_lines,
        parse_time,
        remap_time,
    };
    Ok(LoadedMesh { mesh, stats })
}

fn format_error(line: usize, message: impl Into<String>) -> AssetError {
    AssetError::Format {
        line,
        message: message.into(),
    }
}

fn parse_f32(value: Option<&str>, line: usize, what: &str) -> AssetResult<f32> {
    let token = value.ok_or_else(|| format_error(line, format!("missing {what}")))?;
    token
        .parse::<f32>()
        .map_err(|_| format_error(line, format!("invalid {what} '{token}'")))
}

/// Parse one 1-based OBJ index. Relative (negative) indices are rejected.
fn parse_index(field: &str, line: usize) -> AssetResult<u32> {
    let raw = field
        .trim()
        .parse::<i64>()
        .map_err(|_| format_error(line, format!("invalid index '{field}'")))?;
    if raw < 0 {
        return Err(format_error(
            line,
            format!("relative index {raw} is not supported"),
        ));
    }
    u32::try_from(raw).map_err(|_| format_error(line, format!("index {raw} is too large")))
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::*;

    /// Two triangles sharing the quad diagonal, every attribute distinct.
    const QUAD: &str = "\
# exported quad
o Quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
vn 0.0 0.0 -1.0
vn 1.0 0.0 0.0
vn 0.0 1.0 0.0
usemtl None
s 1
f 1/1/1 2/2/2 3/3/3
f 1/1/1 3/3/3 4/4/4
";

    fn fixture(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("asset-obj-{}-{name}.obj", std::process::id()));
        fs::write(&path, contents).expect("write fixture");
        path
    }

    #[test]
    fn end_to_end_quad_in_face_then_corner_order() {
        for strategy in ObjStrategy::ALL {
            let loaded = load_obj_from_str(QUAD, strategy).expect("parse quad");
            let mesh = &loaded.mesh;
            assert_eq!(mesh.vertex_count(), 6, "{strategy}");
            assert_eq!(mesh.texcoords.len(), 6);
            assert_eq!(mesh.normals.len(), 6);
            assert!(mesh.is_valid());

            assert_eq!(
                mesh.positions,
                vec![
                    [0.0, 0.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [1.0, 1.0, 0.0],
                    [0.0, 0.0, 0.0],
                    [1.0, 1.0, 0.0],
                    [0.0, 1.0, 0.0],
                ]
            );
            assert_eq!(mesh.texcoords[5], [0.0, -1.0]);
            assert_eq!(mesh.normals[1], [0.0, 0.0, -1.0]);
            assert_eq!(mesh.normals[5], [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn strategies_agree_on_well_formed_input() {
        let lines = load_obj_from_str(QUAD, ObjStrategy::Lines).unwrap();
        let tokens = load_obj_from_str(QUAD, ObjStrategy::Tokens).unwrap();
        assert_eq!(lines.mesh, tokens.mesh);
        assert_eq!(lines.stats.faces, tokens.stats.faces);
        assert_eq!(lines.stats.ignored_lines, tokens.stats.ignored_lines);
    }

    /// Quad with tabs, CRLF, blank lines, indentation and `w` components.
    const LOOSE_QUAD: &str = "o Quad\r\n\r\n\
\x20\x20v 0.0 0.0 0.0 1.0\r\n\
\tv 1.0\t0.0 0.0\r\n\
v  1.0  1.0  0.0\r\n\
v 0.0 1.0 0.0\r\n\
\r\n\
vt 0.0 0.0 0.0\r\n\
\tvt 1.0 0.0\r\n\
vt 1.0 1.0 0.0\r\n\
vt 0.0 1.0\r\n\
vn 0.0 0.0 1.0\r\n\
vn 0.0 0.0 -1.0\r\n\
\x20\x20vn 1.0 0.0 0.0\r\n\
vn 0.0 1.0 0.0\r\n\
\r\n\
\x20\x20f 1/1/1\t2/2/2  3/3/3\r\n\
f 1/1/1 3/3/3 4/4/4 \r\n";

    #[test]
    fn strategies_agree_on_loosely_formatted_input() {
        let reference = load_obj_from_str(QUAD, ObjStrategy::Tokens).unwrap().mesh;
        for strategy in ObjStrategy::ALL {
            let loaded = load_obj_from_str(LOOSE_QUAD, strategy)
                .unwrap_or_else(|e| panic!("{strategy}: {e}"));
            assert_eq!(loaded.mesh, reference, "{strategy}");
            assert_eq!(loaded.stats.faces, 2);
            assert_eq!(loaded.stats.ignored_lines, 1);
        }
    }

    #[test]
    fn strategies_agree_on_non_utf8_comments() {
        let src: &[u8] = b"# author: Jos\xE9\nv 0 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 1/1/1 1/1/1\n";
        let lines = load_obj_from_reader(src, ObjStrategy::Lines).expect("lines");
        let tokens = load_obj_from_reader(src, ObjStrategy::Tokens).expect("tokens");
        assert_eq!(lines.mesh, tokens.mesh);
        assert_eq!(lines.mesh.vertex_count(), 3);
    }

    #[test]
    fn reader_entry_point_handles_small_buffers() {
        for strategy in ObjStrategy::ALL {
            let tiny = io::BufReader::with_capacity(5, QUAD.as_bytes());
            let loaded = load_obj_from_reader(tiny, strategy).expect("parse with tiny buffer");
            assert_eq!(loaded.stats.strategy, strategy);
            assert_eq!(loaded.mesh, load_obj_from_str(QUAD, strategy).unwrap().mesh);
        }
    }

    #[test]
    fn loaders_report_their_strategy() {
        for strategy in ObjStrategy::ALL {
            assert_eq!(strategy.loader().strategy(), strategy);
        }
    }

    #[test]
    fn texcoord_v_is_inverted() {
        let src = "v 0 0 0\nvn 0 0 1\nvt 0.2 0.7\nf 1/1/1 1/1/1 1/1/1\n";
        for strategy in ObjStrategy::ALL {
            let mesh = load_obj_from_str(src, strategy).unwrap().mesh;
            assert_eq!(mesh.texcoords[0], [0.2, -0.7]);
        }
    }

    #[test]
    fn corner_indices_select_their_own_pools() {
        let mut src = String::new();
        for i in 1..=5 {
            src.push_str(&format!("v {i}.0 0 0\n"));
        }
        src.push_str("vt 0.1 0.1\nvt 0.2 0.2\n");
        src.push_str("vn 1 0 0\nvn 0 1 0\nvn 0 0 1\n");
        src.push_str("f 5/2/3 1/1/1 2/1/2\n");

        for strategy in ObjStrategy::ALL {
            let mesh = load_obj_from_str(&src, strategy).unwrap().mesh;
            assert_eq!(mesh.positions[0], [5.0, 0.0, 0.0]);
            assert_eq!(mesh.texcoords[0], [0.2, -0.2]);
            assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn unknown_tags_do_not_change_counts() {
        let noisy = format!("# header\ns off\ng group\nmtllib a.mtl\n{QUAD}l 1 2\n");
        for strategy in ObjStrategy::ALL {
            let clean = load_obj_from_str(QUAD, strategy).unwrap();
            let loaded = load_obj_from_str(&noisy, strategy).unwrap();
            let stats = loaded.stats;
            assert_eq!(
                (stats.positions, stats.texcoords, stats.normals, stats.faces),
                (4, 4, 4, 2)
            );
            assert_eq!(stats.ignored_lines, clean.stats.ignored_lines + 5);
            assert_eq!(loaded.mesh, clean.mesh);
        }
    }

    #[test]
    fn two_corner_face_is_rejected_by_token_parser() {
        let src = "v 0 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/2/2\n";
        let err = load_obj_from_str(src, ObjStrategy::Tokens).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFace { line: 4 }), "{err}");
        assert!(err.to_string().contains("exporting"));
    }

    #[test]
    fn polygons_and_relative_indices_are_rejected() {
        let quad_face = "v 0 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 1/1/1 1/1/1 1/1/1\n";
        let relative = "v 0 0 0\nvt 0 0\nvn 0 0 1\nf -1/-1/-1 -1/-1/-1 -1/-1/-1\n";
        for src in [quad_face, relative] {
            assert!(matches!(
                load_obj_from_str(src, ObjStrategy::Tokens),
                Err(AssetError::UnsupportedFace { line: 4 })
            ));
            assert!(matches!(
                load_obj_from_str(src, ObjStrategy::Lines),
                Err(AssetError::Format { line: 4, .. })
            ));
        }
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let src = "v 0 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 1/3/1 1/1/1\n";
        for strategy in ObjStrategy::ALL {
            let err = load_obj_from_str(src, strategy).unwrap_err();
            match err {
                AssetError::IndexOutOfRange {
                    attribute,
                    index,
                    len,
                    corner,
                } => {
                    assert_eq!(attribute, Attribute::TexCoord);
                    assert_eq!((index, len, corner), (3, 1, 1));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn zero_index_is_out_of_range() {
        let src = "v 0 0 0\nvt 0 0\nvn 0 0 1\nf 0/1/1 1/1/1 1/1/1\n";
        for strategy in ObjStrategy::ALL {
            assert!(matches!(
                load_obj_from_str(src, strategy),
                Err(AssetError::IndexOutOfRange {
                    attribute: Attribute::Position,
                    index: 0,
                    ..
                })
            ));
        }
    }

    #[test]
    fn missing_file_names_path_and_leaves_output_alone() {
        let path = std::env::temp_dir().join("asset-obj-does-not-exist.obj");
        let mut out = load_obj_from_str(QUAD, ObjStrategy::Lines).unwrap().mesh;
        let before = out.clone();

        let err = load_obj_into(&path, ObjStrategy::Tokens, &mut out).unwrap_err();
        assert!(matches!(err, AssetError::Open { .. }));
        assert!(err.to_string().contains("asset-obj-does-not-exist.obj"));
        assert_eq!(out, before);
    }

    #[test]
    fn failed_parse_leaves_output_alone_and_names_file() {
        let path = fixture("broken", "v 0 0 0\nf 1/1/1 1/1/1\n");
        let mut out = MeshData::default();
        let err = load_obj_into(&path, ObjStrategy::Tokens, &mut out).unwrap_err();
        fs::remove_file(&path).ok();

        assert!(out.is_empty());
        assert!(err.to_string().contains("asset-obj-"));
        assert!(matches!(err.root(), AssetError::UnsupportedFace { line: 2 }));
    }

    #[test]
    fn load_from_path_appends_on_success() {
        let path = fixture("quad", QUAD);
        let mesh = load_obj_from_path(&path).expect("load quad");
        let mut out = mesh.clone();
        let stats = load_obj_into(&path, ObjStrategy::Lines, &mut out).expect("append quad");
        fs::remove_file(&path).ok();

        assert_eq!(stats.strategy, ObjStrategy::Lines);
        assert_eq!(out.vertex_count(), 12);
        assert_eq!(out.positions[6..], mesh.positions[..]);
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!("tokens".parse::<ObjStrategy>(), Ok(ObjStrategy::Tokens));
        assert_eq!("LINES".parse::<ObjStrategy>(), Ok(ObjStrategy::Lines));
        assert_eq!(
            "fast".parse::<ObjStrategy>(),
            Err(UnknownStrategy("fast".into()))
        );
        assert_eq!(ObjStrategy::default(), ObjStrategy::Tokens);
    }

    #[test]
    fn remap_lengths_follow_face_count() {
        let mut data = ObjData {
            positions: vec![[0.0; 3], [1.0; 3]],
            texcoords: vec![[0.0; 2]],
            normals: vec![[0.0, 0.0, 1.0]],
            ..ObjData::default()
        };
        data.push_face([[1, 1, 1], [2, 1, 1], [1, 1, 1]]);
        data.push_face([[2, 1, 1], [2, 1, 1], [1, 1, 1]]);

        let mesh = data.remap().unwrap();
        assert_eq!(data.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 3 * data.face_count());
        assert_eq!(mesh.positions[3], [1.0; 3]);
    }
}
