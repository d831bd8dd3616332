use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::source::SourceKind;

/// Staging file locations for one source inside the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPaths {
    pub nodes: PathBuf,
    pub edges: PathBuf,
}

impl StagingPaths {
    #[must_use]
    pub fn new(dir: &Path, source: SourceKind) -> Self {
        Self {
            nodes: dir.join(format!("{}_nodes.jsonl", source.file_stem())),
            edges: dir.join(format!("{}_edges.jsonl", source.file_stem())),
        }
    }
}

/// Appends one JSON object per line.
pub struct StagingWriter<T> {
    writer: BufWriter<File>,
    path: PathBuf,
    written: u64,
    _record: PhantomData<T>,
}

impl<T: Serialize> StagingWriter<T> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            written: 0,
            _record: PhantomData,
        })
    }

    pub fn write(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| Error::io(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush().map_err(|e| Error::io(&self.path, e))?;
        Ok(self.written)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedStats {
    pub records: u64,
    pub malformed: u64,
    pub missing: bool,
}

/// Stream records back from a staging file.
///
/// A missing file and undecodable lines are skipped with a warning.
pub fn read_staged<T: DeserializeOwned>(
    path: &Path,
    mut visit: impl FnMut(T),
) -> Result<StagedStats> {
    let mut stats = StagedStats::default();
    if !path.exists() {
        tracing::warn!("Skipping missing staging file: {}", path.display());
        stats.missing = true;
        return Ok(stats);
    }

    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| Error::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(record) => {
                visit(record);
                stats.records += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping malformed line {} in {}: {}", n + 1, path.display(), e);
                stats.malformed += 1;
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::edge::RawEdge;
    use crate::node::RawNode;

    #[test]
    fn test_paths() {
        let paths = StagingPaths::new(Path::new("/out"), SourceKind::IKraph);
        assert_eq!(paths.nodes, Path::new("/out/ikraph_nodes.jsonl"));
        assert_eq!(paths.edges, Path::new("/out/ikraph_edges.jsonl"));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("n.jsonl");

        let mut writer = StagingWriter::create(&path).unwrap();
        writer
            .write(&RawNode::new("UMLS:C1", SourceKind::SemMedDb).with_name("x"))
            .unwrap();
        assert_eq!(writer.finish().unwrap(), 1);

        let mut nodes: Vec<RawNode> = Vec::new();
        let stats = read_staged(&path, |n| nodes.push(n)).unwrap();
        assert_eq!(stats.records, 1);
        assert_eq!(nodes[0].name, "x");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("e.jsonl");
        std::fs::write(
            &path,
            "{\"subject\":\"a\",\"object\":\"b\",\"relation\":\"r\",\"source\":\"PrimeKG\"}\n\
             {not json\n\
             \n\
             {\"subject\":\"a\",\"object\":\"c\",\"relation\":\"r\",\"source\":\"Hetionet\"}\n",
        )
        .unwrap();

        let mut edges: Vec<RawEdge> = Vec::new();
        let stats = read_staged(&path, |e| edges.push(e)).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(stats.malformed, 2);
    }

    #[test]
    fn test_missing_file_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let stats = read_staged::<RawNode>(&dir.path().join("gone.jsonl"), |_| {}).unwrap();
        assert!(stats.missing);
        assert_eq!(stats.records, 0);
    }
}
