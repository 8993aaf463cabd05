//! The [AudioManager] maps logical names to paths, and turns those paths into [PlaybackStream]s on request.
//!
//! Nothing decoded is cached here: every call to [AudioManager::get_stream] opens, decodes and composes a fresh
//! stream, because each player needs its own read position.  What the manager keeps is the table of registered names.
use std::collections::HashMap;
use std::path::Path;

use ahash::RandomState;

use crate::*;

/// Decoders for audio container formats, keyed by lowercase file extension without the dot.
#[derive(Default)]
pub struct FormatTable {
    decoders: HashMap<String, Box<dyn AudioDecoder>, RandomState>,
}

impl FormatTable {
    /// A table with no formats at all.
    pub fn empty() -> FormatTable {
        Default::default()
    }

    /// `.mp3`, `.ogg` and `.wav`, all decoded by symphonia.
    #[cfg(feature = "symphonia")]
    pub fn standard() -> FormatTable {
        let mut table = FormatTable::empty();
        for ext in ["mp3", "ogg", "wav"] {
            table.insert(ext, SymphoniaDecoder::new(ext));
        }
        table
    }

    /// Without symphonia there are no built-in decoders.
    #[cfg(not(feature = "symphonia"))]
    pub fn standard() -> FormatTable {
        FormatTable::empty()
    }

    /// Register a decoder for an extension, replacing any previous one.
    pub fn insert(&mut self, extension: &str, decoder: impl AudioDecoder + 'static) {
        self.decoders
            .insert(extension.to_ascii_lowercase(), Box::new(decoder));
    }

    pub fn with(mut self, extension: &str, decoder: impl AudioDecoder + 'static) -> Self {
        self.insert(extension, decoder);
        self
    }

    /// Find the decoder for a path by its extension.
    pub fn for_path(&self, path: &str) -> Option<&dyn AudioDecoder> {
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        self.decoders.get(&ext).map(|d| &**d)
    }
}

impl std::fmt::Debug for FormatTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatTable")
            .field("extensions", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub struct AudioManager<S: ByteSource> {
    source: S,
    formats: FormatTable,
    /// Logical name to path.
    registered: KeyedCache<String>,
}

impl<S: ByteSource> AudioManager<S> {
    /// Build a manager with the standard formats.
    pub fn new(source: S) -> AudioManager<S> {
        AudioManager::with_formats(source, FormatTable::standard())
    }

    pub fn with_formats(source: S, formats: FormatTable) -> AudioManager<S> {
        AudioManager {
            source,
            formats,
            registered: KeyedCache::new(),
        }
    }

    pub fn formats_mut(&mut self) -> &mut FormatTable {
        &mut self.formats
    }

    /// Map a logical name to a path, replacing any previous mapping.
    pub fn register(&mut self, name: &str, path: &str) {
        tracing::debug!(name, path, "registering audio");
        self.registered.put(name.to_string(), path.to_string());
    }

    /// The path registered for `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.registered.get(name).map(|p| (*p).clone())
    }

    pub fn put(&mut self, name: &str, path: &str) {
        self.register(name, path);
    }

    pub fn remove(&mut self, name: &str) {
        self.registered.remove(name);
    }

    /// Forget every registered name.
    pub fn clear(&mut self) {
        tracing::debug!(count = self.registered.len(), "clearing audio registrations");
        self.registered.clear();
    }

    fn decode(&self, path: &str) -> Result<Box<dyn PcmStream>> {
        let decoder = self
            .formats
            .for_path(path)
            .ok_or_else(|| ResourceError::UnsupportedFormat {
                path: path.to_string(),
            })?;

        // The reader is dropped, and so closed, when this function returns.
        let mut reader = self
            .source
            .open(path)
            .map_err(|e| ResourceError::from_io(path, e))?;
        decoder
            .decode(&mut reader)
            .map_err(|e| ResourceError::decode(path, e))
    }

    /// Decode the audio registered as `name` and compose it according to `options`.
    pub fn get_stream(&self, name: &str, options: &AudioOptions) -> Result<PlaybackStream> {
        let path = self
            .registered
            .get(name)
            .ok_or_else(|| ResourceError::NotRegistered(name.to_string()))?;

        let decoded = self.decode(&path).map_err(|e| {
            tracing::warn!(name, path = %path, "failed to load audio: {}", e);
            e
        })?;
        tracing::trace!(name, length = decoded.length(), ?options, "composing stream");
        PlaybackStream::compose(decoded, options)
    }

    /// Hand a composed stream to the host, then set the player's volume.
    pub fn get_player<H: AudioHost>(
        &self,
        host: &H,
        name: &str,
        options: &AudioOptions,
    ) -> Result<H::Player> {
        let stream = self.get_stream(name, options)?;
        let volume = stream.volume();
        let mut player = host
            .new_player(stream)
            .map_err(|e| ResourceError::Host(Box::new(e)))?;
        player.set_volume(volume);
        Ok(player)
    }
}
