//! An [AudioDecoder] backed by symphonia, which decodes a whole file to interleaved 16-bit little-endian PCM.
use std::io::{Cursor, Read, Seek, SeekFrom};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{AudioDecoder, BoxError, PcmStream};

/// Fully decoded PCM, read as interleaved 16-bit little-endian samples.
#[derive(Debug, Clone)]
pub struct DecodedPcm {
    data: Cursor<Vec<u8>>,
    sample_rate: u32,
    channels: u16,
}

impl DecodedPcm {
    pub fn new(data: Vec<u8>, sample_rate: u32, channels: u16) -> DecodedPcm {
        DecodedPcm {
            data: Cursor::new(data),
            sample_rate,
            channels,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl Read for DecodedPcm {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.data.read(buf)
    }
}

impl Seek for DecodedPcm {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.data.seek(pos)
    }
}

impl PcmStream for DecodedPcm {
    fn length(&self) -> u64 {
        self.data.get_ref().len() as u64
    }

    /// Two bytes per sample, for every channel.
    fn frame_size(&self) -> u64 {
        2 * self.channels.max(1) as u64
    }
}

/// Decodes whatever symphonia can probe, using the extension as a hint.
#[derive(Debug, Clone)]
pub struct SymphoniaDecoder {
    extension: String,
}

impl SymphoniaDecoder {
    pub fn new(extension: &str) -> SymphoniaDecoder {
        SymphoniaDecoder {
            extension: extension.to_string(),
        }
    }

    fn decode_all(&self, bytes: Vec<u8>) -> Result<DecodedPcm, SymphoniaError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(&self.extension);

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let (track_id, params) = match format.default_track() {
            Some(t) => (t.id, t.codec_params.clone()),
            None => return Err(SymphoniaError::Unsupported("no default track")),
        };
        let mut decoder = symphonia::default::get_codecs().make(&params, &DecoderOptions::default())?;

        let mut sample_rate = params.sample_rate.unwrap_or(0);
        let mut channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);
        let mut out = vec![];

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(e) => return Err(e),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u16;

                    let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                    samples.copy_interleaved_ref(decoded);
                    for s in samples.samples() {
                        out.extend_from_slice(&s.to_le_bytes());
                    }
                }
                // A corrupt packet is skipped rather than failing the whole file.
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::debug!("skipping undecodable packet: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(DecodedPcm::new(out, sample_rate, channels))
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Box<dyn PcmStream>, BoxError> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes)?;
        Ok(Box::new(self.decode_all(bytes)?))
    }
}

#[cfg(test)]
/// Build a canonical 16-bit PCM wav file in memory.
pub(crate) fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = vec![];
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
    out.extend_from_slice(&(channels * 2).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wav() {
        let samples = (0..2000).map(|x| (x * 7) as i16).collect::<Vec<_>>();
        let bytes = wav_bytes(2, 44100, &samples);

        let pcm = SymphoniaDecoder::new("wav").decode_all(bytes).unwrap();
        assert_eq!(pcm.sample_rate(), 44100);
        assert_eq!(pcm.channels(), 2);
        assert_eq!(pcm.frame_size(), 4);
        assert_eq!(pcm.length(), 4000);
    }

    #[test]
    fn garbage_is_an_error() {
        let mut reader: &[u8] = b"definitely not audio";
        assert!(SymphoniaDecoder::new("ogg").decode(&mut reader).is_err());
    }

    /// Interleaved stereo frames where frame `i` is `(i * 10, -i * 10)`.
    fn stereo_pcm(frames: i16) -> DecodedPcm {
        let mut data = vec![];
        for i in 0..frames {
            data.extend_from_slice(&(i * 10).to_le_bytes());
            data.extend_from_slice(&(-i * 10).to_le_bytes());
        }
        DecodedPcm::new(data, 44100, 2)
    }

    fn read_frames(stream: &mut impl Read, count: usize) -> Vec<(i16, i16)> {
        let mut bytes = vec![0u8; count * 4];
        stream.read_exact(&mut bytes).unwrap();
        bytes
            .chunks(4)
            .map(|c| {
                (
                    i16::from_le_bytes([c[0], c[1]]),
                    i16::from_le_bytes([c[2], c[3]]),
                )
            })
            .collect()
    }

    #[test]
    fn unaligned_loop_points_round_to_frames() {
        // 10 and 402 bytes both split a 4 byte frame; they should become 8 and 400.
        let opts = crate::AudioOptions::new().intro_length(10).loop_length(402);
        let mut stream = crate::PlaybackStream::compose(Box::new(stereo_pcm(200)), &opts).unwrap();
        assert_eq!(
            stream.loop_region(),
            Some(crate::LoopRegion::new(8, 400).unwrap())
        );

        let frames = read_frames(&mut stream, 2 + 100 * 3);
        for (k, frame) in frames.iter().enumerate() {
            let j = if k < 2 { k } else { 2 + (k - 2) % 100 } as i16;
            assert_eq!(*frame, (j * 10, -j * 10), "frame {}", k);
        }

        // Seeks land on a frame boundary too.
        assert_eq!(stream.seek(SeekFrom::Start(2501)).unwrap(), 100);
        assert_eq!(read_frames(&mut stream, 1), vec![(250, -250)]);
    }
}
