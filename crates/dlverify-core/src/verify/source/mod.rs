//! Pull-based byte sources for downloaded files.
//!
//! The verifier asks a source for the next chunk until it reports end of
//! data. Local files (`file://` URIs or bare paths) are read with tokio;
//! `http(s)://` URIs are fetched with libcurl on a blocking thread.

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Failure to open or read a byte source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("invalid URI: {0}")]
    InvalidUri(String),
    #[error("unsupported URI scheme: {0}")]
    UnsupportedScheme(String),
    #[error("open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read: {0}")]
    Read(#[source] std::io::Error),
    #[error("HTTP {0}")]
    Status(u32),
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("transfer ended before the response started")]
    Closed,
}

/// Tuning for byte sources.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Read size for local files.
    pub chunk_size: usize,
    pub connect_timeout: Duration,
    /// Abort HTTP transfers slower than 1 KiB/s for this long.
    pub low_speed_time: Duration,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            connect_timeout: Duration::from_secs(15),
            low_speed_time: Duration::from_secs(60),
        }
    }
}

/// A stream of opaque byte chunks, delivered in order.
pub trait ByteSource: Send {
    /// Next chunk, or `None` at end of data.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, SourceError>> + Send;
}

/// Source chosen by URI scheme.
#[derive(Debug)]
pub enum Source {
    File(FileSource),
    Http(HttpSource),
}

impl ByteSource for Source {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        match self {
            Source::File(f) => f.next_chunk().await,
            Source::Http(h) => h.next_chunk().await,
        }
    }
}

/// Opens the byte stream behind `uri`.
///
/// For HTTP this waits until the response status is known, so a non-2xx
/// status surfaces here rather than as an empty stream.
pub async fn open_source(uri: &str, options: &SourceOptions) -> Result<Source, SourceError> {
    match url::Url::parse(uri) {
        Ok(u) if u.scheme() == "file" => {
            let path = u
                .to_file_path()
                .map_err(|_| SourceError::InvalidUri(uri.to_string()))?;
            FileSource::open(&path, options.chunk_size)
                .await
                .map(Source::File)
        }
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {
            HttpSource::open(uri, options).await.map(Source::Http)
        }
        // One-letter schemes are Windows drive letters; treat as paths.
        Ok(u) if u.scheme().len() > 1 => Err(SourceError::UnsupportedScheme(u.scheme().to_string())),
        _ => FileSource::open(Path::new(uri), options.chunk_size)
            .await
            .map(Source::File),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn drain(source: &mut Source) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = source.next_chunk().await.unwrap() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn opens_file_uri_and_bare_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"payload").unwrap();
        f.flush().unwrap();

        let uri = url::Url::from_file_path(f.path()).unwrap().to_string();
        let mut source = open_source(&uri, &SourceOptions::default()).await.unwrap();
        assert_eq!(drain(&mut source).await, b"payload");

        let bare = f.path().to_str().unwrap().to_string();
        let mut source = open_source(&bare, &SourceOptions::default()).await.unwrap();
        assert_eq!(drain(&mut source).await, b"payload");
    }

    #[tokio::test]
    async fn missing_file_fails_to_open() {
        let err = open_source("file:///nonexistent/dlverify/missing.bin", &SourceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }), "{err}");
    }

    #[tokio::test]
    async fn unsupported_scheme() {
        let err = open_source("ftp://example.com/x.iso", &SourceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedScheme(s) if s == "ftp"));
    }
}
