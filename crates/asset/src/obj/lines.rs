//! Line-oriented OBJ parser.

use std::io::BufRead;

use super::{MeshLoader, ObjData, ObjStrategy, format_error, parse_f32, parse_index};
use crate::error::{AssetError, AssetResult};

/// Reads the file one line at a time and splits each line on whitespace.
///
/// Blank lines, CRLF endings and trailing `#` comments are accepted. Lines
/// other than `v`, `vt`, `vn` and `f` are skipped undecoded. A face
/// corner only has to split into three `/`-separated integers.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineLoader;

impl MeshLoader for LineLoader {
    fn strategy(&self) -> ObjStrategy {
        ObjStrategy::Lines
    }

    fn parse(&self, reader: &mut dyn BufRead) -> AssetResult<ObjData> {
        let mut data = ObjData::default();
        let mut buf = Vec::with_capacity(128);
        let mut line_no = 0;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| AssetError::Read {
                    line: line_no + 1,
                    source,
                })?;
            if read == 0 {
                break;
            }
            line_no += 1;

            // Only tagged lines are decoded, so names and comments may hold any bytes.
            let trimmed = buf.trim_ascii_start();
            if trimmed.starts_with(b"#") {
                data.ignored_lines += 1;
                continue;
            }
            let content = trimmed
                .iter()
                .position(|&b| b == b'#')
                .map_or(trimmed, |i| &trimmed[..i]);
            let tag_len = content
                .iter()
                .position(|b| b.is_ascii_whitespace())
                .unwrap_or(content.len());

            match &content[..tag_len] {
                b"" => {}
                b"v" | b"vt" | b"vn" | b"f" => {
                    let text = std::str::from_utf8(content)
                        .map_err(|_| format_error(line_no, "line is not valid UTF-8"))?;
                    parse_tagged(&mut data, text, line_no)?;
                }
                _ => data.ignored_lines += 1,
            }
        }

        Ok(data)
    }
}

fn parse_tagged(data: &mut ObjData, content: &str, line_no: usize) -> AssetResult<()> {
    let mut parts = content.split_whitespace();
    match parts.next() {
        Some("v") => {
            let x = parse_f32(parts.next(), line_no, "x coordinate")?;
            let y = parse_f32(parts.next(), line_no, "y coordinate")?;
            let z = parse_f32(parts.next(), line_no, "z coordinate")?;
            data.positions.push([x, y, z]);
        }
        Some("vt") => {
            let u = parse_f32(parts.next(), line_no, "u coordinate")?;
            let v = parse_f32(parts.next(), line_no, "v coordinate")?;
            data.texcoords.push([u, -v]);
        }
        Some("vn") => {
            let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
            let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
            let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
            data.normals.push([nx, ny, nz]);
        }
        Some("f") => {
            let mut corners = [[0; 3]; 3];
            let mut found = 0;
            for token in parts {
                if let Some(slot) = corners.get_mut(found) {
                    *slot = parse_corner(token, line_no)?;
                }
                found += 1;
            }
            if found != 3 {
                return Err(format_error(
                    line_no,
                    format!("face has {found} corners, only triangles are supported"),
                ));
            }
            data.push_face(corners);
        }
        _ => data.ignored_lines += 1,
    }
    Ok(())
}

fn parse_corner(token: &str, line: usize) -> AssetResult<[u32; 3]> {
    let mut fields = token.split('/');
    let mut corner = [0; 3];
    for slot in &mut corner {
        let field = fields.next().ok_or_else(|| {
            format_error(line, format!("face corner '{token}' is not p/t/n"))
        })?;
        *slot = parse_index(field, line)?;
    }
    if fields.next().is_some() {
        return Err(format_error(
            line,
            format!("face corner '{token}' has more than three indices"),
        ));
    }
    Ok(corner)
}
