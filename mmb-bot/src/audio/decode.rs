//! Audio decoder using symphonia
//!
//! # Supported Formats
//!
//! Per Cargo.toml symphonia features (plus symphonia defaults):
//! - MP3 (mp3)
//! - FLAC (flac)
//! - AAC (aac)
//! - MP4/M4A (isomp4)
//! - Ogg Vorbis (vorbis)
//! - WAV/PCM
//!
//! Output keeps the file's native rate and channel layout; every sample
//! format is converted to interleaved f32.

use super::sink::PcmFrame;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

/// Audio decoder handle
///
/// ```ignore
/// let mut decoder = AudioDecoder::open("audio.mp3")?;
/// while let Some(frame) = decoder.decode_chunk()? {
///     sink.write(&frame)?;
/// }
/// ```
pub struct AudioDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    path: PathBuf,
}

impl AudioDecoder {
    /// Open and probe a media file
    pub fn open<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref().to_path_buf();

        let file = File::open(&path)
            .map_err(|e| Error::Decode(format!("Cannot open {}: {}", path.display(), e)))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::Decode(format!("Unsupported format {}: {}", path.display(), e)))?;
        let format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| Error::Decode(format!("No audio track in {}", path.display())))?;
        let track_id = track.id;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Unsupported codec {}: {}", path.display(), e)))?;

        Ok(Self {
            format,
            decoder,
            track_id,
            path,
        })
    }

    /// Decode the next chunk, `None` at end of stream
    ///
    /// Corrupt packets are skipped with a warning; any other error ends the
    /// stream with `Err`.
    pub fn decode_chunk(&mut self) -> Result<Option<PcmFrame>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(e) => {
                    return Err(Error::Decode(format!("{}: {}", self.path.display(), e)));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(msg)) => {
                    warn!("Skipping corrupt packet in {}: {}", self.path.display(), msg);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("{}: {}", self.path.display(), e)));
                }
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);

            return Ok(Some(PcmFrame {
                samples: buffer.samples().to_vec(),
                sample_rate: spec.rate,
                channels: spec.channels.count() as u16,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_nonexistent_file() {
        let result = AudioDecoder::open("/nonexistent/file.mp3");
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_decoder_rejects_non_audio() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"definitely not audio").unwrap();
        assert!(AudioDecoder::open(file.path()).is_err());
    }

    #[test]
    fn test_decode_wav_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..8000 * 2 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut decoder = AudioDecoder::open(&path).unwrap();
        let mut frames = 0;
        while let Some(chunk) = decoder.decode_chunk().unwrap() {
            assert_eq!(chunk.sample_rate, 8000);
            assert_eq!(chunk.channels, 2);
            frames += chunk.frames();
        }
        assert_eq!(frames, 8000);
    }
}
