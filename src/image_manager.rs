//! Images decoded from a [ByteSource], memoized by path.
use std::sync::Arc;

use crate::*;

pub struct ImageManager<S: ByteSource, D: Decoder> {
    source: S,
    decoder: D,
    images: KeyedCache<D::Output>,
}

impl<S: ByteSource, D: Decoder> ImageManager<S, D> {
    pub fn new(source: S, decoder: D) -> ImageManager<S, D> {
        ImageManager {
            source,
            decoder,
            images: KeyedCache::new(),
        }
    }

    /// Get the image at `path`, decoding it the first time it is asked for.
    pub fn get_image(&mut self, path: &str) -> Result<Arc<D::Output>> {
        let source = &self.source;
        let decoder = &self.decoder;
        self.images.get_or_load(path, || {
            tracing::debug!(path, "image cache miss");
            let reader = source
                .open(path)
                .map_err(|e| ResourceError::from_io(path, e))?;
            decoder.decode(reader).map_err(|e| {
                tracing::warn!(path, "failed to decode image: {}", e);
                ResourceError::decode(path, e)
            })
        })
    }

    pub fn get(&self, key: &str) -> Option<Arc<D::Output>> {
        self.images.get(key)
    }

    pub fn put(&mut self, key: &str, image: impl Into<Arc<D::Output>>) {
        self.images.put(key.to_string(), image);
    }

    pub fn remove(&mut self, key: &str) {
        self.images.remove(key);
    }

    pub fn clear(&mut self) {
        tracing::debug!(count = self.images.len(), "clearing images");
        self.images.clear();
    }

    /// Same as [ImageManager::clear].
    pub fn purge_cache(&mut self) {
        self.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
