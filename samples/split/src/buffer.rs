//! Memory-mapped access to an input document and the buffers it references.

use std::{
    collections::HashMap,
    fs::File,
    io,
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
};

use crossbeam::sync::ShardedLock;
use memmap2::Mmap;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("could not map {path:?}: {source}")]
    Map {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("expected file, found directory: {0:?}")]
    IsADirectory(PathBuf),
    #[error("invalid buffer URI {uri:?}: {source}")]
    Uri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    #[error("buffer URI {0:?} does not name a local file")]
    UnsupportedUriScheme(String),
    #[error("{0:?} cannot be expressed as a local file URL")]
    NotAFileUrl(String),
    #[error("document refers to a GLB binary chunk, but has none")]
    MissingBinaryChunk,
    #[error("buffer cache lock poisoned")]
    Poisoned,
}

/// A read-only memory map of a whole file.
#[derive(Debug)]
pub struct MappedFile {
    map: Mmap,
    path: PathBuf,
}

impl MappedFile {
    #[allow(unsafe_code)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BufferError> {
        let path = path.as_ref().to_path_buf();
        let map_err = |source| BufferError::Map {
            path: path.clone(),
            source,
        };
        let file = File::open(&path).map_err(map_err)?;
        if file.metadata().map_err(map_err)?.is_dir() {
            return Err(BufferError::IsADirectory(path));
        }
        // modifying the file while it is mapped is undefined behaviour; inputs are treated as
        // immutable for the life of the process
        let map = unsafe { Mmap::map(&file) }.map_err(map_err)?;
        tracing::trace!(path = %path.display(), bytes = map.len(), "mapped file");
        Ok(Self { map, path })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for MappedFile {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

/// Bytes of one glTF buffer.
#[derive(Debug)]
pub enum BufferData<'doc> {
    /// The binary chunk of a GLB input, borrowed from its mapping
    Chunk(&'doc [u8]),
    /// An external file
    Mapped(MappedFile),
}

impl Deref for BufferData<'_> {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        match self {
            Self::Chunk(data) => data,
            Self::Mapped(file) => file,
        }
    }
}

/// Resolves the buffers of one document, mapping each external file at most once.
#[derive(Debug)]
pub struct BufferCache<'doc> {
    /// URL of the document itself, against which relative URIs resolve
    base: Url,
    chunk: Option<&'doc [u8]>,
    files: ShardedLock<HashMap<Url, Arc<BufferData<'doc>>>>,
}

impl<'doc> BufferCache<'doc> {
    /// `chunk` is the binary chunk of a GLB document, if any.
    pub fn new(chunk: Option<&'doc [u8]>, document: &Path) -> Result<Self, BufferError> {
        let map_err = |source| BufferError::Map {
            path: document.to_path_buf(),
            source,
        };
        let absolute = document.canonicalize().map_err(map_err)?;
        let base = Url::from_file_path(&absolute)
            .map_err(|_| BufferError::NotAFileUrl(absolute.display().to_string()))?;
        Ok(Self {
            base,
            chunk,
            files: ShardedLock::default(),
        })
    }

    /// Map the file a buffer URI names, relative to the document.
    #[tracing::instrument(skip(self), fields(base = self.base.as_str()))]
    pub fn resolve(&self, uri: &str) -> Result<Arc<BufferData<'doc>>, BufferError> {
        let url = Url::options()
            .base_url(Some(&self.base))
            .parse(uri)
            .map_err(|source| BufferError::Uri {
                uri: uri.to_owned(),
                source,
            })?;
        if url.scheme() != "file" {
            return Err(BufferError::UnsupportedUriScheme(url.scheme().to_owned()));
        }

        if let Some(data) = self
            .files
            .read()
            .map_err(|_| BufferError::Poisoned)?
            .get(&url)
        {
            tracing::trace!(url = url.as_str(), "buffer already mapped");
            return Ok(data.clone());
        }

        let path = url
            .to_file_path()
            .map_err(|_| BufferError::NotAFileUrl(url.to_string()))?;
        tracing::debug!(path = %path.display(), "mapping external buffer");
        let data = Arc::new(BufferData::Mapped(MappedFile::open(path)?));
        self.files
            .write()
            .map_err(|_| BufferError::Poisoned)?
            .insert(url, data.clone());
        Ok(data)
    }

    pub fn buffer(&self, buffer: &gltf::Buffer<'_>) -> Result<Arc<BufferData<'doc>>, BufferError> {
        match buffer.source() {
            gltf::buffer::Source::Bin => self
                .chunk
                .map(|c| Arc::new(BufferData::Chunk(c)))
                .ok_or(BufferError::MissingBinaryChunk),
            gltf::buffer::Source::Uri(uri) => self.resolve(uri),
        }
    }

    /// Every buffer of a document, in buffer order.
    pub fn buffers(&self, doc: &gltf::Document) -> Result<Vec<Arc<BufferData<'doc>>>, BufferError> {
        doc.buffers().map(|b| self.buffer(&b)).collect()
    }
}
