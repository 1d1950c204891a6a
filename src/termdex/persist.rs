//! On-disk index format.
//!
//! ```text
//! magic    8 bytes  "TERMDEX\0"
//! version  u32 LE
//! body     bincode: { config, terms: [(id, [shingle])], bands: [[(key, [ordinal])]] }
//! ```
//!
//! The configuration carries the hash-family seed, so a loaded index
//! regenerates the same signatures for new queries. Bucket order inside the
//! file is unspecified; rankings do not depend on it.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use super::indexer::Indexer;
use super::{Buckets, FastHash, Index, TermEntry};

const MAGIC: &[u8; 8] = b"TERMDEX\0";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    config: &'a IndexConfig,
    terms: Vec<(&'a str, &'a [String])>,
    bands: Vec<Vec<(u64, &'a [u32])>>,
}

#[derive(Deserialize)]
struct Snapshot {
    config: IndexConfig,
    terms: Vec<(String, Vec<String>)>,
    bands: Vec<Vec<(u64, Vec<u32>)>>,
}

impl Index {
    /// Serialize the index into a writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let index = &self.index;
        let snapshot = SnapshotRef {
            config: &index.config,
            terms: index.terms.iter()
                .map(|term| (term.id.as_str(), term.shingles.as_slice()))
                .collect(),
            bands: index.bands.iter()
                .map(|buckets| buckets.iter()
                     .map(|(&key, members)| (key, members.as_slice()))
                     .collect())
                .collect(),
        };
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        bincode::serialize_into(&mut writer, &snapshot)?;
        writer.flush()?;
        Ok(())
    }

    /// Reconstruct an index written by `write_to`.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Index> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::InvalidFormat("not a termdex index".to_string()));
        }
        let mut version = [0u8; 4];
        reader.read_exact(&mut version)?;
        let version = u32::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion { found: version, expected: FORMAT_VERSION });
        }

        let snapshot: Snapshot = bincode::deserialize_from(reader)?;
        let terms = snapshot.terms.into_iter()
            .map(|(id, shingles)| TermEntry { id, shingles })
            .collect();
        let bands = snapshot.bands.into_iter()
            .map(|buckets| {
                let mut table: Buckets = HashMap::with_capacity_and_hasher(buckets.len(), FastHash::new());
                table.extend(buckets);
                table
            })
            .collect();
        let indexer = Indexer::from_parts(snapshot.config, terms, bands)?;
        Ok(Index::new(indexer))
    }

    /// Write the index to a file. The file is replaced atomically, a crash
    /// never leaves a half-written index behind.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let parent_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        self.write_to(BufWriter::new(&temp_file))?;
        temp_file.persist(path).map_err(|err| Error::Io(err.error))?;
        info!(path = %path.display(), terms = self.len(), "Index saved");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Index> {
        let path = path.as_ref();
        let index = Index::read_from(BufReader::new(File::open(path)?))?;
        info!(path = %path.display(), terms = index.len(), "Index loaded");
        Ok(index)
    }
}
