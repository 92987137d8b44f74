//! Chunked byte sources and the destination-file sink.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::trace;

use crate::{Error, Result};

/// A pull-based stream of byte chunks from a remote object.
#[async_trait]
pub trait ByteSource: Send {
    /// Next chunk, or `None` once the body is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// Owned, type-erased [`ByteSource`].
pub type BoxByteSource = Box<dyn ByteSource>;

/// A [`ByteSource`] over chunks already in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    chunks: VecDeque<Bytes>,
}

impl MemorySource {
    /// Source yielding `chunks` in order.
    #[must_use]
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.chunks.pop_front())
    }
}

/// Stream `source` into `dest`, truncating any existing file.
///
/// The handle is flushed on success and closed on every exit path. A failed
/// transfer leaves the partial file in place for the caller to discard.
///
/// # Errors
///
/// Propagates the source's errors unchanged and reports local failures as
/// [`Error::Io`] naming `dest`.
pub async fn write_to_file(mut source: BoxByteSource, dest: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| Error::io(e, dest, "create"))?;

    let copied = copy_chunks(&mut source, &mut file, dest).await;
    let flushed = file.flush().await.map_err(|e| Error::io(e, dest, "flush"));
    let written = copied?;
    flushed?;
    Ok(written)
}

async fn copy_chunks(
    source: &mut BoxByteSource,
    file: &mut tokio::fs::File,
    dest: &Path,
) -> Result<u64> {
    let mut written: u64 = 0;
    while let Some(chunk) = source.next_chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io(e, dest, "write"))?;
        written += chunk.len() as u64;
        trace!(written, "Wrote chunk");
    }
    Ok(written)
}
