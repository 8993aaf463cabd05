//! Typed JSON documents, deserialized with serde and memoized by path.
use std::io::Read;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::*;

/// A [Decoder] which deserializes JSON into `T`.
#[derive(Debug)]
pub struct JsonDecoder<T>(PhantomData<fn() -> T>);

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        JsonDecoder(PhantomData)
    }
}

impl<T: DeserializeOwned> Decoder for JsonDecoder<T> {
    type Output = T;
    type Error = serde_json::Error;

    fn decode<R: Read>(&self, reader: R) -> Result<T, serde_json::Error> {
        serde_json::from_reader(reader)
    }
}

pub struct JsonManager<S: ByteSource, T> {
    source: S,
    decoder: JsonDecoder<T>,
    documents: KeyedCache<T>,
}

impl<S: ByteSource, T: DeserializeOwned> JsonManager<S, T> {
    pub fn new(source: S) -> JsonManager<S, T> {
        JsonManager {
            source,
            decoder: Default::default(),
            documents: KeyedCache::new(),
        }
    }

    /// Get the document at `path`, reading it from the source the first time.
    pub fn get_json(&mut self, path: &str) -> Result<Arc<T>> {
        let source = &self.source;
        let decoder = &self.decoder;
        self.documents.get_or_load(path, || {
            tracing::debug!(path, "json cache miss");
            let reader = source
                .open(path)
                .map_err(|e| ResourceError::from_io(path, e))?;
            decoder
                .decode(std::io::BufReader::new(reader))
                .map_err(|e| {
                    tracing::warn!(path, "failed to parse json: {}", e);
                    ResourceError::decode(path, e)
                })
        })
    }

    /// Get the document cached as `key`, parsing `data` if there isn't one yet.
    pub fn get_json_bytes(&mut self, key: &str, data: &[u8]) -> Result<Arc<T>> {
        let decoder = &self.decoder;
        self.documents.get_or_load(key, || {
            decoder
                .decode(data)
                .map_err(|e| ResourceError::decode(key, e))
        })
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.documents.get(key)
    }

    pub fn put(&mut self, key: &str, value: impl Into<Arc<T>>) {
        self.documents.put(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) {
        self.documents.remove(key);
    }

    pub fn clear(&mut self) {
        tracing::debug!(count = self.documents.len(), "clearing json documents");
        self.documents.clear();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Level {
        name: String,
        enemies: Vec<u32>,
    }

    fn build_manager() -> (Arc<MemorySource>, JsonManager<Arc<MemorySource>, Level>) {
        let source = Arc::new(MemorySource::new());
        (source.clone(), JsonManager::new(source))
    }

    #[test]
    fn loads_and_memoizes() {
        let (source, mut json) = build_manager();
        source.insert("levels/1.json", r#"{"name": "one", "enemies": [1, 2]}"#);

        let a = json.get_json("levels/1.json").unwrap();
        assert_eq!(
            *a,
            Level {
                name: "one".into(),
                enemies: vec![1, 2]
            }
        );

        // Changing the file doesn't matter once it's cached.
        source.insert("levels/1.json", r#"{"name": "changed", "enemies": []}"#);
        let b = json.get_json("levels/1.json").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn malformed_then_fixed() {
        let (source, mut json) = build_manager();
        source.insert("l.json", "{not json");
        assert!(matches!(
            json.get_json("l.json"),
            Err(ResourceError::Decode { .. })
        ));
        assert!(json.is_empty());

        source.insert("l.json", r#"{"name": "ok", "enemies": []}"#);
        assert_eq!(json.get_json("l.json").unwrap().name, "ok");
    }

    #[test]
    fn bytes_are_keyed_by_caller() {
        let (_, mut json) = build_manager();
        let first = json
            .get_json_bytes("inline", br#"{"name": "a", "enemies": []}"#)
            .unwrap();
        // A hit ignores the new bytes.
        let second = json
            .get_json_bytes("inline", br#"{"name": "b", "enemies": []}"#)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matches!(
            json.get_json("inline"),
            Ok(ref l) if l.name == "a"
        ));
    }

    #[test]
    fn put_remove_clear() {
        let (_, mut json) = build_manager();
        json.put(
            "k",
            Level {
                name: "put".into(),
                enemies: vec![],
            },
        );
        assert_eq!(json.get("k").unwrap().name, "put");
        json.remove("k");
        assert!(json.get("k").is_none());

        json.get_json_bytes("x", br#"{"name": "x", "enemies": [3]}"#)
            .unwrap();
        json.clear();
        assert!(json.get("x").is_none());
        assert!(matches!(
            json.get_json("x"),
            Err(ResourceError::NotFound { .. })
        ));
    }
}
