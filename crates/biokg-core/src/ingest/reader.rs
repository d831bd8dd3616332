use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    Utf8,
    Latin1,
    Lossy,
}

/// Counts of which decoding tier each line or field needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    pub latin1: u64,
    pub lossy: u64,
}

impl DecodeStats {
    fn record(&mut self, decoding: Decoding) {
        match decoding {
            Decoding::Utf8 => {}
            Decoding::Latin1 => self.latin1 += 1,
            Decoding::Lossy => self.lossy += 1,
        }
    }

    pub fn add(&mut self, other: Self) {
        self.latin1 += other.latin1;
        self.lossy += other.lossy;
    }
}

/// Decode one line or field: UTF-8, then Latin-1, then lossy UTF-8.
///
/// Latin-1 maps every byte, so it is only accepted when the bytes hold no C1
/// control characters (0x80-0x9F); those are almost always mis-encoded text.
#[must_use]
pub fn decode_bytes(bytes: &[u8]) -> (Cow<'_, str>, Decoding) {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (Cow::Borrowed(text), Decoding::Utf8);
    }
    if !bytes.iter().any(|b| (0x80..=0x9F).contains(b)) {
        return (encoding_rs::mem::decode_latin1(bytes), Decoding::Latin1);
    }
    (String::from_utf8_lossy(bytes), Decoding::Lossy)
}

#[must_use]
pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Open a plain or gzip-compressed input, chosen by extension.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Decoded lines of a text file, without trailing newlines.
pub struct TextLines {
    reader: Box<dyn BufRead>,
    path: PathBuf,
    buf: Vec<u8>,
    decode: DecodeStats,
}

impl TextLines {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            reader: open_input(path)?,
            path: path.to_path_buf(),
            buf: Vec::with_capacity(1024),
            decode: DecodeStats::default(),
        })
    }

    #[must_use]
    pub const fn decode_stats(&self) -> DecodeStats {
        self.decode
    }
}

impl Iterator for TextLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                    self.buf.pop();
                }
                let (text, decoding) = decode_bytes(&self.buf);
                self.decode.record(decoding);
                Some(Ok(text.into_owned()))
            }
            Err(e) => Some(Err(Error::io(&self.path, e))),
        }
    }
}

/// Column positions taken from a CSV header row.
#[derive(Debug, Clone, Default)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        let columns = columns
            .into_iter()
            .map(|c| c.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        Self { columns }
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Field value by column name; missing columns and blank cells are `None`.
    #[must_use]
    pub fn get<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.index(name)
            .and_then(|i| row.get(i))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Rows of a CSV file, decoded field by field.
///
/// Rows the CSV parser rejects are skipped and counted; only I/O failures
/// are returned as errors.
pub struct CsvRows {
    reader: csv::Reader<Box<dyn BufRead>>,
    path: PathBuf,
    record: csv::ByteRecord,
    header: Option<Header>,
    decode: DecodeStats,
    rejected: u64,
}

impl CsvRows {
    /// Open without treating the first row specially.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(open_input(path)?);
        Ok(Self {
            reader,
            path: path.to_path_buf(),
            record: csv::ByteRecord::new(),
            header: None,
            decode: DecodeStats::default(),
            rejected: 0,
        })
    }

    /// Open and consume the first row as a header.
    pub fn with_header(path: &Path) -> Result<Self> {
        let mut rows = Self::open(path)?;
        let columns = rows.next().transpose()?.unwrap_or_default();
        rows.header = Some(Header::new(columns));
        Ok(rows)
    }

    /// Drop the first row without interpreting it.
    pub fn skip_header(mut self) -> Result<Self> {
        self.next().transpose()?;
        Ok(self)
    }

    #[must_use]
    pub const fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    #[must_use]
    pub const fn decode_stats(&self) -> DecodeStats {
        self.decode
    }

    #[must_use]
    pub const fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl Iterator for CsvRows {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_byte_record(&mut self.record) {
                Ok(false) => return None,
                Ok(true) => {
                    let mut row = Vec::with_capacity(self.record.len());
                    for field in &self.record {
                        let (text, decoding) = decode_bytes(field);
                        self.decode.record(decoding);
                        row.push(text.into_owned());
                    }
                    return Some(Ok(row));
                }
                Err(e) if e.is_io_error() => return Some(Err(Error::Csv(e))),
                Err(e) => {
                    tracing::debug!("Skipping unreadable row in {}: {}", self.path.display(), e);
                    self.rejected += 1;
                }
            }
        }
    }
}

/// Read an entire small input into memory, decompressing if needed.
pub fn read_to_string(path: &Path) -> Result<String> {
    let mut reader = open_input(path)?;
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(path, e))?;
    Ok(decode_bytes(&bytes).0.into_owned())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    use super::*;

    pub(crate) fn write_plain(dir: impl AsRef<Path>, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.as_ref().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub(crate) fn write_gz(dir: impl AsRef<Path>, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.as_ref().join(name);
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap();
        path
    }

    #[test]
    fn test_decode_tiers() {
        let (text, tier) = decode_bytes("café".as_bytes());
        assert_eq!((text.as_ref(), tier), ("café", Decoding::Utf8));

        let (text, tier) = decode_bytes(b"caf\xe9");
        assert_eq!((text.as_ref(), tier), ("café", Decoding::Latin1));

        let (text, tier) = decode_bytes(b"bad\x93quote");
        assert_eq!(tier, Decoding::Lossy);
        assert!(text.contains('\u{fffd}'));
    }

    #[test]
    fn test_text_lines_plain_and_gzip() {
        let dir = TempDir::new().unwrap();
        let content = b"first\r\nsecond caf\xe9\nthird";
        let plain = write_plain(&dir, "a.txt", content);
        let gz = write_gz(&dir, "a.txt.gz", content);

        for path in [plain, gz] {
            let mut lines = TextLines::open(&path).unwrap();
            let collected: Vec<String> = lines.by_ref().map(Result::unwrap).collect();
            assert_eq!(collected, vec!["first", "second café", "third"]);
            assert_eq!(lines.decode_stats().latin1, 1);
        }
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = TextLines::open(&dir.path().join("nope.csv")).err().unwrap();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_csv_header_lookup() {
        let dir = TempDir::new().unwrap();
        let path = write_plain(
            &dir,
            "n.csv",
            b"\xef\xbb\xbfnode_index,node_id,node_name\n0,\"9796\",\"PHYHIP, like\"\n1,7918,\n",
        );

        let mut rows = CsvRows::with_header(&path).unwrap();
        let header = rows.header().cloned().unwrap();
        assert_eq!(header.index("node_index"), Some(0));

        let first = rows.next().unwrap().unwrap();
        assert_eq!(header.get(&first, "node_name"), Some("PHYHIP, like"));

        let second = rows.next().unwrap().unwrap();
        assert_eq!(header.get(&second, "node_name"), None);
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_csv_short_rows_are_kept() {
        let dir = TempDir::new().unwrap();
        let path = write_gz(&dir, "e.csv.gz", b"a,b,c\nx,y\n");
        let rows: Vec<Vec<String>> = CsvRows::open(&path).unwrap().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 2);
    }
}
