//! Minimal NumPy `.npy` v1.0 reader/writer
//!
//! Covers exactly what the pipeline persists: little-endian f32 window and
//! feature arrays (`<f4`) and i8 label vectors (`|i1`), C order. Anything
//! else is rejected rather than guessed at.

use eegprep_core::{EegError, EegResult};
use std::fs;
use std::path::Path;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Array payload: the two element types the pipeline uses.
#[derive(Debug, Clone, PartialEq)]
pub enum NpyData {
    F32(Vec<f32>),
    I8(Vec<i8>),
}

/// Dense array: flat data with shape metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub data: NpyData,
}

impl NpyArray {
    pub fn f32(shape: Vec<usize>, data: Vec<f32>) -> EegResult<Self> {
        check_len(&shape, data.len())?;
        Ok(Self {
            shape,
            data: NpyData::F32(data),
        })
    }

    pub fn i8(shape: Vec<usize>, data: Vec<i8>) -> EegResult<Self> {
        check_len(&shape, data.len())?;
        Ok(Self {
            shape,
            data: NpyData::I8(data),
        })
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        match &self.data {
            NpyData::F32(v) => v.len(),
            NpyData::I8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            NpyData::F32(v) => Some(v),
            NpyData::I8(_) => None,
        }
    }

    pub fn as_i8(&self) -> Option<&[i8]> {
        match &self.data {
            NpyData::I8(v) => Some(v),
            NpyData::F32(_) => None,
        }
    }

    /// Serialize to an in-memory `.npy` buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let descr = match &self.data {
            NpyData::F32(_) => "<f4",
            NpyData::I8(_) => "|i1",
        };
        let shape_str = match self.shape.len() {
            1 => format!("({},)", self.shape[0]),
            _ => format!(
                "({})",
                self.shape
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        let mut header = format!(
            "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
            descr, shape_str
        );
        // Pad so magic + version + length field + header is 64-aligned
        let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
        let padding = (64 - unpadded % 64) % 64;
        header.push_str(&" ".repeat(padding));
        header.push('\n');

        let mut buf = Vec::with_capacity(MAGIC.len() + 4 + header.len() + self.len() * 4);
        buf.extend_from_slice(MAGIC);
        buf.push(1); // major version
        buf.push(0); // minor version
        buf.extend_from_slice(&(header.len() as u16).to_le_bytes());
        buf.extend_from_slice(header.as_bytes());
        match &self.data {
            NpyData::F32(v) => {
                for x in v {
                    buf.extend_from_slice(&x.to_le_bytes());
                }
            }
            NpyData::I8(v) => {
                for x in v {
                    buf.push(*x as u8);
                }
            }
        }
        buf
    }

    /// Parse an in-memory `.npy` buffer.
    pub fn from_bytes(buf: &[u8]) -> EegResult<Self> {
        let NpyHeader {
            shape,
            descr,
            data_start,
        } = read_header(buf)?;
        let count: usize = shape.iter().product();

        let payload = &buf[data_start..];
        match descr.as_str() {
            "<f4" => {
                if payload.len() < count * 4 {
                    return Err(format_err("truncated f32 payload"));
                }
                let data = payload[..count * 4]
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                NpyArray::f32(shape, data)
            }
            "|i1" | "<i1" => {
                if payload.len() < count {
                    return Err(format_err("truncated i8 payload"));
                }
                let data = payload[..count].iter().map(|&b| b as i8).collect();
                NpyArray::i8(shape, data)
            }
            other => Err(format_err(&format!("unsupported dtype '{}'", other))),
        }
    }

    /// Write to a file, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> EegResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Read from a file.
    pub fn read(path: &Path) -> EegResult<Self> {
        let buf = fs::read(path).map_err(|e| EegError::UnreadableSource {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(&buf).map_err(|e| EegError::UnreadableSource {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Parsed `.npy` header: shape, dtype string, and payload offset.
pub(crate) struct NpyHeader {
    pub shape: Vec<usize>,
    pub descr: String,
    pub data_start: usize,
}

/// Parse the header of an `.npy` buffer. `buf` need only contain the
/// header, not the payload, which is what lets file-backed readers parse
/// a prefix and seek the rest.
pub(crate) fn read_header(buf: &[u8]) -> EegResult<NpyHeader> {
    if buf.len() < 10 {
        return Err(format_err("file too small for .npy header"));
    }
    if &buf[..6] != MAGIC {
        return Err(format_err("missing .npy magic"));
    }
    if buf[6] != 1 {
        return Err(format_err(&format!("unsupported .npy version {}", buf[6])));
    }
    let header_len = u16::from_le_bytes([buf[8], buf[9]]) as usize;
    let data_start = 10 + header_len;
    if buf.len() < data_start {
        return Err(format_err("truncated .npy header"));
    }
    let header = std::str::from_utf8(&buf[10..data_start])
        .map_err(|_| format_err("non-UTF8 .npy header"))?;

    if header.contains("'fortran_order': True") {
        return Err(format_err("fortran-order arrays are not supported"));
    }
    let descr = extract_quoted(header, "'descr':")
        .ok_or_else(|| format_err("missing descr in .npy header"))?;
    let shape = parse_shape(header)?;
    Ok(NpyHeader {
        shape,
        descr,
        data_start,
    })
}

fn check_len(shape: &[usize], len: usize) -> EegResult<()> {
    let expected: usize = shape.iter().product();
    if expected != len {
        return Err(EegError::ShapeMismatch {
            reason: format!("shape {:?} expects {} values, got {}", shape, expected, len),
        });
    }
    Ok(())
}

fn format_err(reason: &str) -> EegError {
    EegError::ShapeMismatch {
        reason: reason.to_string(),
    }
}

fn extract_quoted(header: &str, key: &str) -> Option<String> {
    let after = &header[header.find(key)? + key.len()..];
    let open = after.find('\'')?;
    let rest = &after[open + 1..];
    let close = rest.find('\'')?;
    Some(rest[..close].to_string())
}

fn parse_shape(header: &str) -> EegResult<Vec<usize>> {
    let key = "'shape':";
    let after = &header[header
        .find(key)
        .ok_or_else(|| format_err("missing shape in .npy header"))?
        + key.len()..];
    let open = after
        .find('(')
        .ok_or_else(|| format_err("malformed shape tuple"))?;
    let close = after[open..]
        .find(')')
        .ok_or_else(|| format_err("malformed shape tuple"))?
        + open;
    after[open + 1..close]
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| format_err(&format!("bad shape dimension '{}'", s)))
        })
        .collect()
}
