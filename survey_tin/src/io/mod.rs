//! File input and output helpers for surfaces and design lines.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};

use crate::dtm::Tin;
use crate::geometry::Point3;

/// Reads a file to string.
pub fn read_to_string(path: &str) -> io::Result<String> {
    let mut buffer = String::new();
    File::open(path)?.read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Writes a string to a file, replacing its contents.
pub fn write_string(path: &str, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())
}

/// Reads a file line by line.
pub fn read_lines(path: &str) -> io::Result<Vec<String>> {
    BufReader::new(File::open(path)?).lines().collect()
}

/// Reads a TIN from JSON and checks its adjacency.
pub fn read_tin_json(path: &str) -> io::Result<Tin> {
    let contents = read_to_string(path)?;
    let tin: Tin = serde_json::from_str(&contents)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    tin.validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    log::debug!(
        "read {path}: {} vertices, {} triangles",
        tin.vertex_count(),
        tin.triangle_count()
    );
    Ok(tin)
}

/// Writes a TIN as pretty-printed JSON.
pub fn write_tin_json(path: &str, tin: &Tin) -> io::Result<()> {
    let json = serde_json::to_string_pretty(tin).map_err(io::Error::other)?;
    write_string(path, &json)
}

fn parse_field(value: &str, line: usize) -> io::Result<f64> {
    value.trim().parse::<f64>().map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("line {line}: {e}"))
    })
}

/// Reads a polyline from `x,y[,z]` lines. Missing elevations are 0. Blank
/// lines and lines starting with `#` are skipped.
pub fn read_polyline_csv(path: &str) -> io::Result<Vec<Point3>> {
    let lines = read_lines(path)?;
    let mut pts = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 2 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line {}: expected x,y[,z]", idx + 1),
            ));
        }
        let x = parse_field(parts[0], idx + 1)?;
        let y = parse_field(parts[1], idx + 1)?;
        let z = match parts.get(2) {
            Some(v) => parse_field(v, idx + 1)?,
            None => 0.0,
        };
        pts.push(Point3::new(x, y, z));
    }
    Ok(pts)
}
