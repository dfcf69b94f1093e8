//! Binary and ASCII edge files, and the streaming counting passes.
//!
//! The binary format is a bare concatenation of little-endian `u64` pairs,
//! `u` then `v`, with no header or framing. Star files use the same layout
//! for `(node, representative)` pairs.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use emcc_storage::{ExternalSorter, Limits, Rewind, Streamer};

use crate::graph::{Edge, Node, NodeAsc, NodeComponent, MAX_NODE, MIN_NODE};
use crate::stream::{EdgeStream, UniqueFilter};

/// A buffered writer of binary edge (or star) files.
pub struct EdgeFileWriter {
    writer: BufWriter<File>,
    written: u64,
}

impl EdgeFileWriter {
    /// Creates (or truncates) the file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(EdgeFileWriter {
            writer: BufWriter::new(File::create(path)?),
            written: 0,
        })
    }

    /// Appends one pair.
    pub fn push(&mut self, u: Node, v: Node) -> io::Result<()> {
        debug_assert!(u > MIN_NODE && u < MAX_NODE && v > MIN_NODE && v < MAX_NODE);
        self.writer.write_u64::<LittleEndian>(u)?;
        self.writer.write_u64::<LittleEndian>(v)?;
        self.written += 1;
        Ok(())
    }

    /// Flushes and reports the number of pairs written.
    pub fn finish(mut self) -> io::Result<u64> {
        self.writer.flush()?;
        Ok(self.written)
    }
}

impl emcc_storage::Pushable<Edge> for EdgeFileWriter {
    fn push(&mut self, item: Edge) -> io::Result<()> {
        EdgeFileWriter::push(self, item.u, item.v)
    }
}

impl emcc_storage::Pushable<NodeComponent> for EdgeFileWriter {
    fn push(&mut self, item: NodeComponent) -> io::Result<()> {
        EdgeFileWriter::push(self, item.node, item.comp)
    }
}

/// Reads a sorted binary edge file into an edge stream, dropping
/// consecutive parallel edges.
///
/// Returns `(edges kept, parallel edges dropped)`. Order violations in the
/// file surface as the stream's sorted-input assertion.
pub fn read_edges(path: &Path, stream: &mut EdgeStream) -> io::Result<(u64, u64)> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut kept = 0u64;
    let mut dropped = 0u64;
    let mut previous = Edge::new(MIN_NODE, MIN_NODE);
    loop {
        let u = match reader.read_u64::<LittleEndian>() {
            Ok(value) => value,
            Err(ref error) if error.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(error) => return Err(error),
        };
        let v = reader.read_u64::<LittleEndian>()?;
        let edge = Edge::new(u, v);
        if kept > 0 && edge == previous {
            dropped += 1;
            continue;
        }
        stream.push(edge)?;
        previous = edge;
        kept += 1;
    }
    Ok((kept, dropped))
}

/// Writes a `(node, representative)` stream as a binary star file.
pub fn write_components<S>(path: &Path, map: &mut S) -> io::Result<u64>
where
    S: Streamer<Item = NodeComponent>,
{
    let mut writer = EdgeFileWriter::create(path)?;
    while !map.empty() {
        let entry = map.peek();
        writer.push(entry.node, entry.comp)?;
        map.advance()?;
    }
    writer.finish()
}

/// Converts a whitespace-separated ASCII edge list to the binary format.
///
/// The first `skip_lines` lines are ignored, and every identifier is
/// adjusted by `add` minus `subtract` before validation against the
/// reserved sentinels.
pub fn ascii_to_binary(
    input: &Path,
    output: &Path,
    skip_lines: u64,
    add: Node,
    subtract: Node,
) -> io::Result<u64> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer = EdgeFileWriter::create(output)?;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if (index as u64) < skip_lines {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (u, v) = match (fields.next(), fields.next()) {
            (Some(u), Some(v)) => (u, v),
            (None, _) => continue,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("expected two node IDs, got {:?}", line),
                ))
            }
        };
        let parse = |field: &str| {
            field.parse::<Node>().map_err(|error| {
                io::Error::new(io::ErrorKind::InvalidData, format!("bad node ID: {}", error))
            })
        };
        let u = parse(u)?.wrapping_add(add).wrapping_sub(subtract);
        let v = parse(v)?.wrapping_add(add).wrapping_sub(subtract);
        assert!(u > MIN_NODE && u < MAX_NODE && v > MIN_NODE && v < MAX_NODE);
        writer.push(u, v)?;
    }
    writer.finish()
}

/// Renders a binary edge file as ASCII, one `u v` pair per line.
pub fn binary_to_ascii(input: &Path, output: &Path) -> io::Result<u64> {
    let mut reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    let mut pairs = 0u64;
    loop {
        let u = match reader.read_u64::<LittleEndian>() {
            Ok(value) => value,
            Err(ref error) if error.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(error) => return Err(error),
        };
        let v = reader.read_u64::<LittleEndian>()?;
        writeln!(writer, "{} {}", u, v)?;
        pairs += 1;
    }
    writer.flush()?;
    Ok(pairs)
}

/// Counts the distinct nodes of a sorted edge stream in one pass plus an
/// external sort of the endpoints, rewinding the stream afterwards.
pub fn count_distinct_nodes<S>(edges: &mut S, limits: &Limits) -> io::Result<u64>
where
    S: Streamer<Item = Edge> + Rewind,
{
    let mut nodes = ExternalSorter::<Node, NodeAsc>::new(limits);
    let mut previous_source = MIN_NODE;
    while !edges.empty() {
        let edge = edges.peek();
        if edge.u != previous_source {
            nodes.push(edge.u)?;
            previous_source = edge.u;
        }
        nodes.push(edge.v)?;
        edges.advance()?;
    }
    edges.rewind()?;
    nodes.sort()?;
    let mut unique = UniqueFilter::new(&mut nodes);
    let mut count = 0u64;
    while !unique.empty() {
        count += 1;
        unique.advance()?;
    }
    Ok(count)
}

/// Parses a byte count with an optional decimal (`K`, `M`, `G`, `T`) or
/// binary (`Ki`, `Mi`, `Gi`, `Ti`) suffix, e.g. `"512Mi"` or `"4G"`.
pub fn parse_byte_size(text: &str) -> Option<u64> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, suffix) = text.split_at(split);
    let value: u64 = digits.parse().ok()?;
    let factor: u64 = match suffix {
        "" => 1,
        "K" | "k" => 1000,
        "M" => 1000 * 1000,
        "G" => 1000 * 1000 * 1000,
        "T" => 1000u64.pow(4),
        "Ki" | "ki" => 1 << 10,
        "Mi" => 1 << 20,
        "Gi" => 1 << 30,
        "Ti" => 1 << 40,
        _ => return None,
    };
    value.checked_mul(factor)
}

/// The largest node ID of a stream, rewinding it afterwards.
pub fn max_node_id<S>(edges: &mut S) -> io::Result<Node>
where
    S: Streamer<Item = Edge> + Rewind,
{
    let mut max = MIN_NODE;
    while !edges.empty() {
        let edge = edges.peek();
        max = max.max(edge.u).max(edge.v);
        edges.advance()?;
    }
    edges.rewind()?;
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("emcc-io-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn binary_roundtrip_drops_parallel_edges() {
        let limits = Limits::default();
        let path = temp_path("roundtrip.bin");
        let mut writer = EdgeFileWriter::create(&path).unwrap();
        writer.push(1, 2).unwrap();
        writer.push(1, 2).unwrap();
        writer.push(2, 5).unwrap();
        assert_eq!(writer.finish().unwrap(), 3);

        let mut stream = EdgeStream::new(&limits);
        let (kept, dropped) = read_edges(&path, &mut stream).unwrap();
        assert_eq!((kept, dropped), (2, 1));
        stream.consume().unwrap();
        assert_eq!(stream.peek(), Edge::new(1, 2));
        stream.advance().unwrap();
        assert_eq!(stream.peek(), Edge::new(2, 5));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn ascii_conversion_applies_offsets() {
        let ascii = temp_path("edges.txt");
        let binary = temp_path("edges.bin");
        std::fs::write(&ascii, "# header\n0 1\n1 2\n").unwrap();
        // Skip the header and shift the zero-based IDs up by one.
        let written = ascii_to_binary(&ascii, &binary, 1, 1, 0).unwrap();
        assert_eq!(written, 2);

        let round = temp_path("edges-round.txt");
        assert_eq!(binary_to_ascii(&binary, &round).unwrap(), 2);
        let text = std::fs::read_to_string(&round).unwrap();
        assert_eq!(text, "1 2\n2 3\n");
        for path in [&ascii, &binary, &round] {
            std::fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn node_counting() {
        let limits = Limits::default();
        let mut stream = EdgeStream::new(&limits);
        for (u, v) in [(1, 2), (1, 7), (2, 7), (9, 11)] {
            stream.push(Edge::new(u, v)).unwrap();
        }
        stream.consume().unwrap();
        assert_eq!(count_distinct_nodes(&mut stream, &limits).unwrap(), 6);
        assert_eq!(max_node_id(&mut stream).unwrap(), 11);
        // Both passes leave the stream rewound.
        assert_eq!(stream.peek(), Edge::new(1, 2));
    }
}
