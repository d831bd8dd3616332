use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use super::kg::{KgEdge, KgNode};
use crate::edge::EdgeRecord;
use crate::error::{Error, Result};
use crate::node::NodeRecord;

fn write_lines<R: Serialize>(path: &Path, records: impl IntoIterator<Item = R>) -> Result<u64> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut written = 0;
    for record in records {
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n").map_err(|e| Error::io(path, e))?;
        written += 1;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(written)
}

pub fn write_nodes(path: &Path, nodes: &[NodeRecord], update_date: &str) -> Result<u64> {
    write_lines(path, nodes.iter().map(|n| KgNode::new(n, update_date)))
}

pub fn write_edges(path: &Path, edges: &[EdgeRecord], update_date: &str) -> Result<u64> {
    write_lines(path, edges.iter().map(|e| KgEdge::new(e, update_date)))
}
