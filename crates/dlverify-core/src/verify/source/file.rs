//! Local file source.

use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::{ByteSource, SourceError};

/// Reads a local file in fixed-size chunks.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    chunk_size: usize,
}

impl FileSource {
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, SourceError> {
        let file = File::open(path).await.map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            file,
            chunk_size: chunk_size.max(1),
        })
    }
}

impl ByteSource for FileSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let mut buf = vec![0u8; self.chunk_size];
        let n = self.file.read(&mut buf).await.map_err(SourceError::Read)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }
}
