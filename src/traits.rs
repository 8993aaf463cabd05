//! The seams between the caches and the outside world.
//!
//! A [ByteSource] converts logical paths to readers, a [Decoder] turns those readers into decoded values, and the audio
//! side has its own object-safe [AudioDecoder] producing [PcmStream]s which are finally handed to an [AudioHost].
use std::io::{Cursor, Error, Read, Seek};
use std::sync::Arc;

use crate::{BoxError, PlaybackStream};

/// "open" a "file" and return a reader over it.
pub trait ByteSource: Send + Sync + 'static {
    type Reader: Read + Seek + Send + 'static;

    /// Open a file.  A missing file must be reported with [std::io::ErrorKind::NotFound].
    fn open(&self, path: &str) -> Result<Self::Reader, Error>;
}

impl<T: ByteSource + ?Sized> ByteSource for Arc<T> {
    type Reader = T::Reader;

    fn open(&self, path: &str) -> Result<Self::Reader, Error> {
        (**self).open(path)
    }
}

/// A `Decoder` knows how to get from a reader to a decoded representation in memory.
pub trait Decoder {
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    fn decode<R: Read>(&self, reader: R) -> Result<Self::Output, Self::Error>;
}

/// A decoded, seekable PCM stream of known length.
///
/// The length is in whatever unit the stream reads in, usually bytes; loop lengths and intro lengths are interpreted
/// in the same unit.
pub trait PcmStream: Read + Seek + Send {
    fn length(&self) -> u64;

    /// Size of one frame (a sample for every channel) in the same unit as [PcmStream::length].  Loop points are
    /// rounded down to a multiple of this.
    fn frame_size(&self) -> u64 {
        1
    }
}

impl<T: AsRef<[u8]> + Send> PcmStream for Cursor<T> {
    fn length(&self) -> u64 {
        self.get_ref().as_ref().len() as u64
    }
}

/// Decodes one container format into a [PcmStream].
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, reader: &mut dyn Read) -> Result<Box<dyn PcmStream>, BoxError>;
}

/// A controllable handle returned by the host runtime.
pub trait Player {
    /// Scale output amplitude.  Always called with a value in `[0, 1]`.
    fn set_volume(&mut self, volume: f64);
}

/// The host runtime's audio context, which turns composed streams into players.
pub trait AudioHost {
    type Player: Player;
    type Error: std::error::Error + Send + Sync + 'static;

    fn new_player(&self, stream: PlaybackStream) -> Result<Self::Player, Self::Error>;
}
