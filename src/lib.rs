//! Per-resource-type caches for games and other multimedia programs.
//!
//! Loading an asset is the same dance for every kind of asset: open some bytes, decode them, and keep the result
//! around so the next request for the same key is free.  This crate factors that into a [KeyedCache], which produces
//! each value at most once per key and never caches failures, then builds a manager per resource type on top of it:
//!
//! - [ImageManager] and [JsonManager] memoize decoded documents by path.
//! - [FontManager] keeps parsed font sources by name, and memoizes size-specialized [FontFace]s under a composite
//!   [FaceKey], so that different sizes never collide.
//! - [CustomManager] is just the cache, for whatever the caller wants to put in it.
//! - [AudioManager] maps logical names to paths and composes decoded audio into [PlaybackStream]s, optionally looping
//!   forever after an intro.  The seek arithmetic for loops lives in [LoopRegion].
//!
//! [ResourceManager] bundles the audio, font and image managers over one shared [ByteSource], plus tables of typed
//! JSON and custom managers.
//!
//! To use this crate, implement [Decoder] for your image and font types (and [AudioHost] for your audio backend), pick
//! a [ByteSource] such as [FilesystemSource] or [MemorySource], and construct a [ResourceManager].  With the default
//! `symphonia` feature, `.mp3`, `.ogg` and `.wav` audio decode out of the box.
//!
//! Nothing here locks.  Managers take `&mut self` for anything that may load, so sharing one across threads means
//! putting it behind a lock.
mod audio_manager;
mod config;
mod custom_manager;
mod error;
mod filesystem_source;
mod font_manager;
mod image_manager;
mod json_manager;
mod keyed_cache;
mod loop_stream;
mod memory_source;
mod resource_manager;
#[cfg(feature = "symphonia")]
mod symphonia_decoder;
mod traits;

pub use audio_manager::*;
pub use config::*;
pub use custom_manager::*;
pub use error::*;
pub use filesystem_source::*;
pub use font_manager::*;
pub use image_manager::*;
pub use json_manager::*;
pub use keyed_cache::*;
pub use loop_stream::*;
pub use memory_source::*;
pub use resource_manager::*;
#[cfg(feature = "symphonia")]
pub use symphonia_decoder::*;
pub use traits::*;
