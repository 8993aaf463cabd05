//! The [ResourceManager] bundles one audio, font and image manager over a shared [ByteSource], plus tables of typed
//! JSON and custom managers which callers register under small integer ids.
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use serde::de::DeserializeOwned;

use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonId(pub u32);

/// Lets the typed tables hold managers of any value type and still clear them.
trait AnyManager: Send {
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + Sync + 'static> AnyManager for CustomManager<T> {
    fn clear(&mut self) {
        CustomManager::clear(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<S: ByteSource, T: DeserializeOwned + Send + Sync + 'static> AnyManager for JsonManager<S, T> {
    fn clear(&mut self) {
        JsonManager::clear(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

type ManagerTable<Id> = HashMap<Id, Box<dyn AnyManager>, RandomState>;

pub struct ResourceManager<S: ByteSource, FD: Decoder, ID: Decoder> {
    source: Arc<S>,
    pub audio: AudioManager<Arc<S>>,
    pub font: FontManager<Arc<S>, FD>,
    pub image: ImageManager<Arc<S>, ID>,
    custom: ManagerTable<CustomId>,
    json: ManagerTable<JsonId>,
}

impl<S: ByteSource, FD: Decoder, ID: Decoder> ResourceManager<S, FD, ID> {
    /// Build a manager whose audio side knows the standard formats.
    pub fn new(source: S, font_decoder: FD, image_decoder: ID) -> ResourceManager<S, FD, ID> {
        ResourceManager::with_formats(source, FormatTable::standard(), font_decoder, image_decoder)
    }

    pub fn with_formats(
        source: S,
        formats: FormatTable,
        font_decoder: FD,
        image_decoder: ID,
    ) -> ResourceManager<S, FD, ID> {
        let source = Arc::new(source);
        ResourceManager {
            audio: AudioManager::with_formats(source.clone(), formats),
            font: FontManager::new(source.clone(), font_decoder),
            image: ImageManager::new(source.clone(), image_decoder),
            source,
            custom: Default::default(),
            json: Default::default(),
        }
    }

    /// The byte source shared by every manager.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Register a custom manager, replacing whatever was under `id`.
    pub fn add_custom_manager<T: Send + Sync + 'static>(
        &mut self,
        id: CustomId,
        manager: CustomManager<T>,
    ) {
        self.custom.insert(id, Box::new(manager));
    }

    /// The custom manager under `id`, if there is one holding `T`.
    pub fn custom_manager<T: Send + Sync + 'static>(&self, id: CustomId) -> Option<&CustomManager<T>> {
        self.custom.get(&id)?.as_any().downcast_ref()
    }

    pub fn custom_manager_mut<T: Send + Sync + 'static>(
        &mut self,
        id: CustomId,
    ) -> Option<&mut CustomManager<T>> {
        self.custom.get_mut(&id)?.as_any_mut().downcast_mut()
    }

    pub fn remove_custom_manager(&mut self, id: CustomId) {
        self.custom.remove(&id);
    }

    /// Make a JSON manager reading from this manager's byte source, ready to pass to
    /// [ResourceManager::add_json_manager].
    pub fn new_json_manager<T: DeserializeOwned>(&self) -> JsonManager<Arc<S>, T> {
        JsonManager::new(self.source.clone())
    }

    /// Register a JSON manager, replacing whatever was under `id`.
    pub fn add_json_manager<T: DeserializeOwned + Send + Sync + 'static>(
        &mut self,
        id: JsonId,
        manager: JsonManager<Arc<S>, T>,
    ) {
        self.json.insert(id, Box::new(manager));
    }

    /// The JSON manager under `id`, if there is one producing `T`.
    pub fn json_manager<T: DeserializeOwned + Send + Sync + 'static>(
        &self,
        id: JsonId,
    ) -> Option<&JsonManager<Arc<S>, T>> {
        self.json.get(&id)?.as_any().downcast_ref()
    }

    pub fn json_manager_mut<T: DeserializeOwned + Send + Sync + 'static>(
        &mut self,
        id: JsonId,
    ) -> Option<&mut JsonManager<Arc<S>, T>> {
        self.json.get_mut(&id)?.as_any_mut().downcast_mut()
    }

    pub fn remove_json_manager(&mut self, id: JsonId) {
        self.json.remove(&id);
    }

    /// Clear every manager, including the registered ones.  The registrations themselves stay.
    pub fn clear(&mut self) {
        self.audio.clear();
        self.font.clear();
        self.image.clear();
        for m in self.custom.values_mut().chain(self.json.values_mut()) {
            m.clear();
        }
    }
}

impl<FD: Decoder, ID: Decoder> ResourceManager<FilesystemSource, FD, ID> {
    /// Build a filesystem-backed manager, registering the configured audio and loading the configured fonts.
    pub fn from_config(
        config: &ResourceManagerConfig,
        font_decoder: FD,
        image_decoder: ID,
    ) -> Result<ResourceManager<FilesystemSource, FD, ID>> {
        let mut manager = ResourceManager::new(
            FilesystemSource::new(&config.root_dir),
            font_decoder,
            image_decoder,
        );

        for (name, path) in &config.audio {
            manager.audio.register(name, path);
        }
        for (name, path) in &config.fonts {
            manager.font.load_font(name, path)?;
        }

        tracing::info!(
            root = %config.root_dir.display(),
            audio = config.audio.len(),
            fonts = config.fonts.len(),
            "resource manager ready"
        );
        Ok(manager)
    }
}
