use bytes::Bytes;
use futures::{ Stream, StreamExt };
use log::info;
use std::io;
use std::path::{ Path, PathBuf };
use tokio::fs;
use tokio::io::{ AsyncWrite, AsyncWriteExt };

/// Directory uploaded documents land in, relative to the working directory.
pub const UPLOAD_DIR: &str = "uploads";

/// Copy buffer size for uploads, 50 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 50 * 1024 * 1024;

/// Writes uploaded files under a fixed directory, one file per original
/// filename. Uploading the same name again replaces the previous file.
#[derive(Clone, Debug)]
pub struct FileStore {
    upload_dir: PathBuf,
    chunk_size: usize,
}

impl FileStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self::with_chunk_size(upload_dir, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(upload_dir: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            chunk_size,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Streams `source` into `<upload_dir>/<filename>` and returns the final
    /// path. The directory is created on first use; a failure mid-stream
    /// leaves a partial file behind at that path.
    pub async fn save<S>(&self, filename: &str, source: S) -> io::Result<PathBuf>
        where S: Stream<Item = io::Result<Bytes>> + Unpin
    {
        fs::create_dir_all(&self.upload_dir).await?;
        let path = self.upload_dir.join(filename);
        info!("Saving file: {}", path.display());

        let mut file = fs::File::create(&path).await?;
        write_chunked(&mut file, source, self.chunk_size).await?;
        file.flush().await?;

        info!("File saved: {}", path.display());
        Ok(path)
    }
}

/// Drains `source` into `writer`, buffering up to `chunk_size` bytes before
/// each write. A source of S bytes hits the writer exactly ceil(S / C)
/// times, and peak memory stays near one chunk regardless of file size.
pub async fn write_chunked<W, S>(
    writer: &mut W,
    mut source: S,
    chunk_size: usize
) -> io::Result<u64>
    where W: AsyncWrite + Unpin, S: Stream<Item = io::Result<Bytes>> + Unpin
{
    assert!(chunk_size > 0);
    let mut buffer: Vec<u8> = Vec::new();
    let mut written = 0u64;

    while let Some(piece) = source.next().await {
        let mut piece = piece?;
        while buffer.len() + piece.len() >= chunk_size {
            let take = chunk_size - buffer.len();
            buffer.extend_from_slice(&piece.split_to(take));
            writer.write_all(&buffer).await?;
            written += buffer.len() as u64;
            buffer.clear();
        }
        buffer.extend_from_slice(&piece);
    }

    if !buffer.is_empty() {
        writer.write_all(&buffer).await?;
        written += buffer.len() as u64;
    }

    Ok(written)
}
