//! A [ByteSource] over an in-memory table, for bundled assets and tests.
use std::collections::HashMap;
use std::io::{Cursor, Error, ErrorKind};
use std::sync::{Arc, RwLock};

use crate::ByteSource;

#[derive(Debug, Default)]
pub struct MemorySource(RwLock<HashMap<String, Arc<[u8]>>>);

impl MemorySource {
    pub fn new() -> MemorySource {
        Default::default()
    }

    /// Add a file, returning the previous contents at that path.
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) -> Option<Arc<[u8]>> {
        let bytes: Vec<u8> = bytes.into();
        self.0
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string(), Arc::from(bytes))
    }

    pub fn remove(&self, path: &str) -> Option<Arc<[u8]>> {
        self.0
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path)
    }
}

impl ByteSource for MemorySource {
    type Reader = Cursor<Arc<[u8]>>;

    fn open(&self, path: &str) -> Result<Self::Reader, Error> {
        let ret = self
            .0
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("{} not found", path)))?
            .clone();
        Ok(Cursor::new(ret))
    }
}
