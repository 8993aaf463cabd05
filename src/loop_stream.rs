//! Composition of decoded PCM streams into playback streams.
//!
//! A decoded stream is either played once as-is, or wrapped in a [LoopStream] which repeats a window of it forever,
//! optionally after playing an intro once.  Every position is in the decoded stream's own unit (usually bytes), and loop
//! points and seek targets are rounded down to the stream's [PcmStream::frame_size].
use std::io::{Error, ErrorKind, Read, Result as IoResult, Seek, SeekFrom};

use crate::{PcmStream, ResourceError, Result};

/// How a decoded stream should be played.  The default plays once at full volume.
///
/// Setting a loop length or an intro length turns looping on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioOptions {
    looping: bool,
    intro_length: Option<u64>,
    loop_length: Option<u64>,
    volume: f64,
}

impl Default for AudioOptions {
    fn default() -> Self {
        AudioOptions {
            looping: false,
            intro_length: None,
            loop_length: None,
            volume: 1.0,
        }
    }
}

impl AudioOptions {
    pub fn new() -> AudioOptions {
        Default::default()
    }

    /// Loop the whole stream.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Length of the repeating window.  Defaults to the length of the decoded stream.
    pub fn loop_length(mut self, length: u64) -> Self {
        self.loop_length = Some(length);
        self.looping = true;
        self
    }

    /// Length of a prefix which is played once before the loop begins.
    pub fn intro_length(mut self, length: u64) -> Self {
        self.intro_length = Some(length);
        self.looping = true;
        self
    }

    /// Volume between 0 and 1.  Values outside that range are clamped when the stream is composed.
    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn get_intro_length(&self) -> Option<u64> {
        self.intro_length
    }

    pub fn get_loop_length(&self) -> Option<u64> {
        self.loop_length
    }

    pub fn get_volume(&self) -> f64 {
        self.volume
    }

    /// Resolve the repeating window against the total length of a decoded stream.
    ///
    /// Both lengths are rounded down to a whole number of frames, so that a loop never starts partway into a sample.
    pub fn resolve_region(&self, total_length: u64, frame_size: u64) -> Result<Option<LoopRegion>> {
        if !self.looping {
            return Ok(None);
        }

        let frame_size = frame_size.max(1);
        let align = |x: u64| x - x % frame_size;

        let intro = align(self.intro_length.unwrap_or(0));
        if intro >= total_length {
            return Err(ResourceError::InvalidLoop(format!(
                "intro of {} does not fit in a stream of length {}",
                intro, total_length
            )));
        }

        LoopRegion::new(intro, align(self.loop_length.unwrap_or(total_length))).map(Some)
    }
}

/// Clamp a volume to `[0, 1]`, treating NaN as full volume.
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        1.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// The window `[intro, intro + loop_length)` repeated after an intro of `intro` units.  A plain loop has an intro of 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopRegion {
    intro: u64,
    loop_length: u64,
}

impl LoopRegion {
    pub fn new(intro: u64, loop_length: u64) -> Result<LoopRegion> {
        if loop_length == 0 {
            return Err(ResourceError::InvalidLoop(
                "loop length must be greater than zero".into(),
            ));
        }
        if intro.checked_add(loop_length).is_none() {
            return Err(ResourceError::InvalidLoop("loop end overflows".into()));
        }

        Ok(LoopRegion { intro, loop_length })
    }

    pub fn intro(&self) -> u64 {
        self.intro
    }

    pub fn loop_length(&self) -> u64 {
        self.loop_length
    }

    /// One past the last position of the repeating window.
    pub fn end(&self) -> u64 {
        self.intro + self.loop_length
    }

    /// Map a position on the infinite timeline to a position in the decoded stream.
    pub fn map_position(&self, position: u64) -> u64 {
        if position < self.intro {
            position
        } else {
            self.intro + (position - self.intro) % self.loop_length
        }
    }
}

/// An infinite stream which plays the intro of a [LoopRegion] once, then repeats its window forever.
///
/// The source is only repositioned when reading, so building one does no I/O.
pub struct LoopStream {
    source: Box<dyn PcmStream>,
    region: LoopRegion,
    frame_size: u64,
    /// Current position in the decoded stream, inside `[0, region.end()]`.  Reaching the end means the next read
    /// starts over at the intro boundary.
    position: u64,
    /// Whether the source's own position matches `position`.
    in_sync: bool,
}

impl LoopStream {
    pub fn new(source: Box<dyn PcmStream>, region: LoopRegion) -> LoopStream {
        let frame_size = source.frame_size().max(1);
        LoopStream {
            source,
            region,
            frame_size,
            position: 0,
            in_sync: false,
        }
    }

    pub fn region(&self) -> LoopRegion {
        self.region
    }

    fn rewind(&mut self) {
        self.position = self.region.intro();
        self.in_sync = false;
    }

    fn sync(&mut self) -> IoResult<()> {
        if !self.in_sync {
            self.source.seek(SeekFrom::Start(self.position))?;
            self.in_sync = true;
        }
        Ok(())
    }
}

impl Read for LoopStream {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if self.position >= self.region.end() {
                self.rewind();
            }
            self.sync()?;

            let remaining = self.region.end() - self.position;
            let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            let got = self.source.read(&mut buf[..want])?;

            if got == 0 {
                // The decoded stream ended inside the window.  If we're already at the start of the window there's
                // nothing to repeat.
                if self.position == self.region.intro() {
                    return Err(Error::new(
                        ErrorKind::UnexpectedEof,
                        "loop window is past the end of the stream",
                    ));
                }
                self.rewind();
                continue;
            }

            self.position += got as u64;
            return Ok(got);
        }
    }
}

impl Seek for LoopStream {
    fn seek(&mut self, pos: SeekFrom) -> IoResult<u64> {
        let target = match pos {
            SeekFrom::Start(p) => p,
            SeekFrom::Current(delta) => {
                let target = self.position as i128 + delta as i128;
                if target < 0 {
                    return Err(Error::new(
                        ErrorKind::InvalidInput,
                        "seek to a negative position",
                    ));
                }
                u64::try_from(target).map_err(|_| {
                    Error::new(ErrorKind::InvalidInput, "seek position overflows")
                })?
            }
            SeekFrom::End(_) => {
                return Err(Error::new(
                    ErrorKind::Unsupported,
                    "an infinite loop has no end to seek from",
                ))
            }
        };

        let mapped = self.region.map_position(target);
        self.position = mapped - mapped % self.frame_size;
        self.in_sync = false;
        self.sync()?;
        Ok(self.position)
    }
}

enum StreamKind {
    Once(Box<dyn PcmStream>),
    Looped(LoopStream),
}

/// A composed stream ready to hand to a player, carrying the volume the player should be set to.
pub struct PlaybackStream {
    kind: StreamKind,
    volume: f64,
}

impl PlaybackStream {
    /// Wrap `source` according to `options`.
    pub fn compose(source: Box<dyn PcmStream>, options: &AudioOptions) -> Result<PlaybackStream> {
        let volume = clamp_volume(options.get_volume());
        let kind = match options.resolve_region(source.length(), source.frame_size())? {
            None => StreamKind::Once(source),
            Some(region) => StreamKind::Looped(LoopStream::new(source, region)),
        };

        Ok(PlaybackStream { kind, volume })
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// The repeating window, or `None` for a stream which plays once.
    pub fn loop_region(&self) -> Option<LoopRegion> {
        match &self.kind {
            StreamKind::Once(_) => None,
            StreamKind::Looped(l) => Some(l.region()),
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.loop_region().is_some()
    }
}

impl Read for PlaybackStream {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        match &mut self.kind {
            StreamKind::Once(s) => s.read(buf),
            StreamKind::Looped(l) => l.read(buf),
        }
    }
}

impl Seek for PlaybackStream {
    fn seek(&mut self, pos: SeekFrom) -> IoResult<u64> {
        match &mut self.kind {
            StreamKind::Once(s) => s.seek(pos),
            StreamKind::Looped(l) => l.seek(pos),
        }
    }
}

impl std::fmt::Debug for PlaybackStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackStream")
            .field("loop_region", &self.loop_region())
            .field("volume", &self.volume)
            .finish()
    }
}
