//! Plain-text records for fitted lattices and densification results.
//!
//! All records are whitespace-separated token streams with counts written
//! before the items they frame:
//!
//! - lattice: `b0.xyz b1.xyz width height corner.xyz plane.abcd n (index col row)*n`
//! - densified points: `n (x y z m (view id px py)*m)*n`
//! - densified entries: `n (index col row)*n`
//!
//! Absent measurement ids are written as `-1`.

use crate::error::{LatticeError, Result};
use crate::types::{GridIndexEntry, LatticeStructure, PointMeasurement, TriangulatedPoint};

use nalgebra::{Vector2, Vector3, Vector4};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which densification record a store holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    DensifyPoints,
    DensifyIndices,
}

impl RecordKind {
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::DensifyPoints => "densifyingPoints.txt",
            RecordKind::DensifyIndices => "densifyingPointsIndices.txt",
        }
    }
}

/// Persistent storage for densification records.
pub trait RecordStore {
    fn write_record(&mut self, kind: RecordKind, contents: &str) -> Result<()>;
    fn read_record(&self, kind: RecordKind) -> Result<String>;
}

/// Records stored as files in one directory.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, kind: RecordKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

impl RecordStore for DirectoryStore {
    fn write_record(&mut self, kind: RecordKind, contents: &str) -> Result<()> {
        let path = self.path(kind);
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        fs::write(&path, contents).map_err(|e| io_error(&path, e))
    }

    fn read_record(&self, kind: RecordKind) -> Result<String> {
        let path = self.path(kind);
        fs::read_to_string(&path).map_err(|e| io_error(&path, e))
    }
}

/// In-memory records, mostly for tests and dry runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: HashMap<RecordKind, String>,
}

impl MemoryStore {
    pub fn get(&self, kind: RecordKind) -> Option<&str> {
        self.records.get(&kind).map(String::as_str)
    }
}

impl RecordStore for MemoryStore {
    fn write_record(&mut self, kind: RecordKind, contents: &str) -> Result<()> {
        self.records.insert(kind, contents.to_string());
        Ok(())
    }

    fn read_record(&self, kind: RecordKind) -> Result<String> {
        self.records
            .get(&kind)
            .cloned()
            .ok_or_else(|| LatticeError::Io {
                path: PathBuf::from(kind.file_name()),
                reason: "record not present".into(),
            })
    }
}

fn io_error(path: &Path, err: std::io::Error) -> LatticeError {
    LatticeError::Io {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Sequential reader over whitespace-separated tokens.
struct Tokens<'a> {
    record: &'static str,
    iter: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(record: &'static str, text: &'a str) -> Self {
        Self {
            record,
            iter: text.split_whitespace(),
        }
    }

    fn next<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.iter.next().ok_or_else(|| self.malformed(format!("missing {what}")))?;
        token
            .parse()
            .map_err(|_| self.malformed(format!("bad {what} '{token}'")))
    }

    fn vec3(&mut self, what: &str) -> Result<Vector3<f64>> {
        Ok(Vector3::new(self.next(what)?, self.next(what)?, self.next(what)?))
    }

    fn malformed(&self, reason: String) -> LatticeError {
        LatticeError::MalformedRecord {
            record: self.record.to_string(),
            reason,
        }
    }
}

// --- lattice record ----------------------------------------------------------

/// Serializes a fitted lattice and its on-grid entries. Unfit lattices
/// produce an empty record.
pub fn write_lattice(lattice: &LatticeStructure, entries: &[GridIndexEntry]) -> String {
    let Some([b0, b1]) = lattice.basis() else {
        return String::new();
    };
    let mut out = String::new();
    for v in [b0, b1] {
        let _ = writeln!(out, "{}\n{}\n{}", v.x, v.y, v.z);
    }
    let _ = writeln!(out, "{}\n{}", lattice.width, lattice.height);
    let c = lattice.corner;
    let _ = writeln!(out, "{}\n{}\n{}", c.x, c.y, c.z);
    let p = lattice.plane;
    let _ = writeln!(out, "{}\n{}\n{}\n{}", p[0], p[1], p[2], p[3]);
    let _ = writeln!(out, "{}", entries.len());
    for e in entries {
        let _ = writeln!(out, "{}\n{}\n{}", e.point_index, e.column, e.row);
    }
    out
}

pub fn parse_lattice(text: &str) -> Result<(LatticeStructure, Vec<GridIndexEntry>)> {
    let mut t = Tokens::new("lattice", text);
    let b0 = t.vec3("basis vector 0")?;
    let b1 = t.vec3("basis vector 1")?;
    let width = t.next("width")?;
    let height = t.next("height")?;
    let corner = t.vec3("corner")?;
    let plane = Vector4::new(
        t.next("plane")?,
        t.next("plane")?,
        t.next("plane")?,
        t.next("plane")?,
    );
    let count: usize = t.next("entry count")?;
    let entries = read_entries(&mut t, count)?;
    Ok((
        LatticeStructure::new(plane, [b0, b1], corner, width, height),
        entries,
    ))
}

pub fn save_lattice_file(
    path: &Path,
    lattice: &LatticeStructure,
    entries: &[GridIndexEntry],
) -> Result<()> {
    fs::write(path, write_lattice(lattice, entries)).map_err(|e| io_error(path, e))
}

pub fn load_lattice_file(path: &Path) -> Result<(LatticeStructure, Vec<GridIndexEntry>)> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    parse_lattice(&text)
}

// --- densification records ---------------------------------------------------

pub fn write_points(points: &[TriangulatedPoint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", points.len());
    for p in points {
        let _ = write!(
            out,
            "{} {} {} {}",
            p.pos.x,
            p.pos.y,
            p.pos.z,
            p.measurements.len()
        );
        for m in &p.measurements {
            let _ = write!(
                out,
                " {} {} {} {}",
                m.view,
                m.id.unwrap_or(-1),
                m.pos.x,
                m.pos.y
            );
        }
        out.push('\n');
    }
    out
}

pub fn parse_points(text: &str) -> Result<Vec<TriangulatedPoint>> {
    let mut t = Tokens::new(RecordKind::DensifyPoints.file_name(), text);
    let count: usize = t.next("point count")?;
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let pos = t.vec3("position")?;
        let n: usize = t.next("measurement count")?;
        let mut measurements = Vec::with_capacity(n);
        for _ in 0..n {
            let view = t.next("view id")?;
            let id: i32 = t.next("measurement id")?;
            let pixel = Vector2::new(t.next("pixel x")?, t.next("pixel y")?);
            measurements.push(PointMeasurement {
                pos: pixel,
                view,
                id: (id >= 0).then_some(id),
            });
        }
        points.push(TriangulatedPoint::new(pos, measurements));
    }
    Ok(points)
}

pub fn write_entries(entries: &[GridIndexEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", entries.len());
    for e in entries {
        let _ = writeln!(out, "{} {} {}", e.point_index, e.column, e.row);
    }
    out
}

/// Entries exactly as stored, including their original point indices.
pub fn parse_entries(text: &str) -> Result<Vec<GridIndexEntry>> {
    let mut t = Tokens::new(RecordKind::DensifyIndices.file_name(), text);
    let count: usize = t.next("entry count")?;
    read_entries(&mut t, count)
}

fn read_entries(t: &mut Tokens<'_>, count: usize) -> Result<Vec<GridIndexEntry>> {
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let point_index = t.next("point index")?;
        let column = t.next("grid column")?;
        let row = t.next("grid row")?;
        entries.push(GridIndexEntry::new(point_index, column, row));
    }
    Ok(entries)
}
