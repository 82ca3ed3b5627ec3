//! Token-oriented OBJ parser.
//!
//! Tokens are cut directly out of the reader's buffer, so no per-line
//! `String` is ever built. This is the faster of the two parsers on large
//! meshes, at the price of a strict face syntax.

use std::io::BufRead;

use super::{MeshLoader, ObjData, ObjStrategy, format_error};
use crate::error::{AssetError, AssetResult};

#[derive(Clone, Copy, Debug, Default)]
pub struct TokenLoader;

impl MeshLoader for TokenLoader {
    fn strategy(&self) -> ObjStrategy {
        ObjStrategy::Tokens
    }

    fn parse(&self, reader: &mut dyn BufRead) -> AssetResult<ObjData> {
        let mut tokens = TokenReader::new(reader);
        let mut data = ObjData::default();

        while tokens.next_token()? {
            match Tag::from_bytes(tokens.token()) {
                Tag::Position => {
                    let x = tokens.float("x coordinate")?;
                    let y = tokens.float("y coordinate")?;
                    let z = tokens.float("z coordinate")?;
                    data.positions.push([x, y, z]);
                    tokens.skip_line()?;
                }
                Tag::TexCoord => {
                    let u = tokens.float("u coordinate")?;
                    let v = tokens.float("v coordinate")?;
                    data.texcoords.push([u, -v]);
                    tokens.skip_line()?;
                }
                Tag::Normal => {
                    let nx = tokens.float("nx coordinate")?;
                    let ny = tokens.float("ny coordinate")?;
                    let nz = tokens.float("nz coordinate")?;
                    data.normals.push([nx, ny, nz]);
                    tokens.skip_line()?;
                }
                Tag::Face => {
                    let line = tokens.line();
                    let mut corners = [[0; 3]; 3];
                    for corner in &mut corners {
                        if !tokens.next_field()? {
                            return Err(AssetError::UnsupportedFace { line });
                        }
                        *corner = parse_corner(tokens.token())
                            .ok_or(AssetError::UnsupportedFace { line })?;
                    }
                    if !tokens.at_line_end()? {
                        return Err(AssetError::UnsupportedFace { line });
                    }
                    data.push_face(corners);
                }
                Tag::Other => {
                    data.ignored_lines += 1;
                    tokens.skip_line()?;
                }
            }
        }

        Ok(data)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Position,
    TexCoord,
    Normal,
    Face,
    Other,
}

impl Tag {
    fn from_bytes(token: &[u8]) -> Self {
        match token {
            b"v" => Tag::Position,
            b"vt" => Tag::TexCoord,
            b"vn" => Tag::Normal,
            b"f" => Tag::Face,
            _ => Tag::Other,
        }
    }
}

/// Strict `p/t/n` with unsigned decimal indices and nothing else.
fn parse_corner(token: &[u8]) -> Option<[u32; 3]> {
    let mut fields = token.split(|&b| b == b'/');
    let mut corner = [0; 3];
    for slot in &mut corner {
        *slot = parse_decimal(fields.next()?)?;
    }
    fields.next().is_none().then_some(corner)
}

fn parse_decimal(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}

fn fill<'a, R: BufRead>(reader: &'a mut R, line: usize) -> AssetResult<&'a [u8]> {
    reader
        .fill_buf()
        .map_err(|source| AssetError::Read { line, source })
}

/// Whitespace tokenizer over a [`BufRead`], tracking the current line.
struct TokenReader<R> {
    reader: R,
    token: Vec<u8>,
    line: usize,
}

impl<R: BufRead> TokenReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            token: Vec::with_capacity(64),
            line: 1,
        }
    }

    fn token(&self) -> &[u8] {
        &self.token
    }

    fn line(&self) -> usize {
        self.line
    }

    /// Next token anywhere in the stream. `false` at end of input.
    fn next_token(&mut self) -> AssetResult<bool> {
        self.skip_space(true)?;
        self.read_token()
    }

    /// Next token on the current line. `false` if the line ends first.
    fn next_field(&mut self) -> AssetResult<bool> {
        self.skip_space(false)?;
        self.read_token()
    }

    fn float(&mut self, what: &str) -> AssetResult<f32> {
        if !self.next_field()? {
            return Err(format_error(self.line, format!("missing {what}")));
        }
        std::str::from_utf8(&self.token)
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .ok_or_else(|| {
                format_error(
                    self.line,
                    format!("invalid {what} '{}'", String::from_utf8_lossy(&self.token)),
                )
            })
    }

    /// `true` if only blanks remain before the newline or end of input.
    fn at_line_end(&mut self) -> AssetResult<bool> {
        self.skip_space(false)?;
        let buf = fill(&mut self.reader, self.line)?;
        Ok(buf.first().is_none_or(|&b| b == b'\n'))
    }

    /// Discard everything up to and including the next newline.
    fn skip_line(&mut self) -> AssetResult<()> {
        loop {
            let buf = fill(&mut self.reader, self.line)?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    self.reader.consume(i + 1);
                    self.line += 1;
                    return Ok(());
                }
                None => {
                    let n = buf.len();
                    self.reader.consume(n);
                }
            }
        }
    }

    fn skip_space(&mut self, across_lines: bool) -> AssetResult<()> {
        loop {
            let buf = fill(&mut self.reader, self.line)?;
            if buf.is_empty() {
                return Ok(());
            }
            let mut skipped = 0;
            let mut newlines = 0;
            let mut stopped = false;
            for &b in buf {
                if b == b'\n' {
                    if !across_lines {
                        stopped = true;
                        break;
                    }
                    newlines += 1;
                } else if !b.is_ascii_whitespace() {
                    stopped = true;
                    break;
                }
                skipped += 1;
            }
            self.reader.consume(skipped);
            self.line += newlines;
            if stopped {
                return Ok(());
            }
        }
    }

    fn read_token(&mut self) -> AssetResult<bool> {
        self.token.clear();
        loop {
            let buf = fill(&mut self.reader, self.line)?;
            if buf.is_empty() {
                break;
            }
            let end = buf
                .iter()
                .position(|b| b.is_ascii_whitespace())
                .unwrap_or(buf.len());
            self.token.extend_from_slice(&buf[..end]);
            let complete = end < buf.len();
            self.reader.consume(end);
            if complete {
                break;
            }
        }
        Ok(!self.token.is_empty())
    }
}
