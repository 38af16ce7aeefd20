//! Hierarchy file format.
//!
//! All values little-endian, no header, no padding:
//!
//! ```text
//! u32 index_count
//! u32 index[index_count]
//! u32 node_count
//! node[node_count]:
//!     f32 min.x, min.y, min.z, max.x, max.y, max.z
//!     u32 start
//!     u32 end
//!     i32 right_child        (-1 = leaf)
//! ```
//!
//! Compact nodes are never stored; they are rebuilt after reading.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::node::BuildNode;
use super::validate::validate_structure;
use crate::util::{Aabb, Error, Result, Vec3};

/// Bytes per serialized node.
pub const NODE_RECORD_SIZE: usize = 6 * 4 + 4 + 4 + 4;

/// Write the index list and node array.
pub fn write_hierarchy<W: Write>(w: &mut W, indices: &[u32], nodes: &[BuildNode]) -> Result<()> {
    w.write_u32::<LittleEndian>(count_u32(indices.len())?)?;
    for &i in indices {
        w.write_u32::<LittleEndian>(i)?;
    }

    w.write_u32::<LittleEndian>(count_u32(nodes.len())?)?;
    for node in nodes {
        for v in node.aabb.min.to_array().into_iter().chain(node.aabb.max.to_array()) {
            w.write_f32::<LittleEndian>(v)?;
        }
        w.write_u32::<LittleEndian>(node.start)?;
        w.write_u32::<LittleEndian>(node.end)?;
        w.write_i32::<LittleEndian>(node.right_child_raw())?;
    }
    Ok(())
}

/// Encode into an in-memory buffer.
pub fn encode(indices: &[u32], nodes: &[BuildNode]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + indices.len() * 4 + nodes.len() * NODE_RECORD_SIZE);
    // Vec<u8> writes cannot fail; only the u32 count check can
    let written = write_hierarchy(&mut buf, indices, nodes);
    debug_assert!(written.is_ok(), "hierarchy counts exceed u32: {written:?}");
    buf
}

/// Write a hierarchy file, replacing any existing one.
pub fn export_to(path: impl AsRef<Path>, indices: &[u32], nodes: &[BuildNode]) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_hierarchy(&mut writer, indices, nodes)?;
    writer.flush()?;
    Ok(())
}

fn count_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::TooManyTriangles(len))
}

/// Bounds-checked little-endian reader over a byte slice.
struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(data) }
    }

    #[inline]
    fn offset(&self) -> u64 {
        self.cursor.position()
    }

    #[inline]
    fn remaining(&self) -> u64 {
        self.cursor.get_ref().len() as u64 - self.offset()
    }

    /// Fail unless `bytes` more bytes are available.
    fn require(&self, bytes: u64) -> Result<()> {
        let remaining = self.remaining();
        if bytes > remaining {
            return Err(Error::UnexpectedEof {
                offset: self.offset(),
                needed: bytes - remaining,
            });
        }
        Ok(())
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        Ok(self.cursor.read_u32::<LittleEndian>()?)
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.require(4)?;
        Ok(self.cursor.read_i32::<LittleEndian>()?)
    }

    fn read_f32(&mut self) -> Result<f32> {
        self.require(4)?;
        Ok(self.cursor.read_f32::<LittleEndian>()?)
    }

    fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }
}

/// Decode without structural checks.
fn decode_raw(data: &[u8]) -> Result<(Vec<u32>, Vec<BuildNode>)> {
    let mut r = ByteReader::new(data);

    let index_count = r.read_u32()? as u64;
    r.require(index_count * 4)?;
    let mut indices = Vec::with_capacity(index_count as usize);
    for _ in 0..index_count {
        indices.push(r.read_u32()?);
    }

    let node_count = r.read_u32()? as u64;
    r.require(node_count * NODE_RECORD_SIZE as u64)?;
    let mut nodes = Vec::with_capacity(node_count as usize);
    for p in 0..node_count {
        let min = r.read_vec3()?;
        let max = r.read_vec3()?;
        let start = r.read_u32()?;
        let end = r.read_u32()?;
        let right_child = match r.read_i32()? {
            -1 => None,
            c if c >= 0 => Some(c as u32),
            c => {
                return Err(Error::malformed(format!("node {p} has right child {c}")));
            }
        };
        nodes.push(BuildNode {
            aabb: Aabb::new(min, max),
            start,
            end,
            right_child,
        });
    }

    if r.remaining() != 0 {
        return Err(Error::malformed(format!(
            "{} trailing bytes after node array",
            r.remaining()
        )));
    }

    Ok((indices, nodes))
}

/// Decode and check a hierarchy buffer.
pub fn decode(data: &[u8]) -> Result<(Vec<u32>, Vec<BuildNode>)> {
    let (indices, nodes) = decode_raw(data)?;
    validate_structure(&indices, &nodes)?;
    Ok((indices, nodes))
}

/// Read and check a hierarchy file.
pub fn import_from(path: impl AsRef<Path>) -> Result<(Vec<u32>, Vec<BuildNode>)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::malformed(format!("cannot open {}: {}", path.display(), e))
        }
    })?;

    let size = file.metadata()?.len();
    if size == 0 {
        return Err(Error::UnexpectedEof { offset: 0, needed: 4 });
    }

    #[cfg(feature = "mmap")]
    {
        // Safety: read-only mapping, dropped before returning
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| Error::MmapFailed(e.to_string()))?;
        decode(&mmap)
    }

    #[cfg(not(feature = "mmap"))]
    {
        use std::io::Read;
        let mut data = Vec::with_capacity(size as usize);
        let mut file = file;
        file.read_to_end(&mut data)?;
        decode(&data)
    }
}
