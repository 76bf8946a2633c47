//! Symphonia-backed implementation of the core's audio decode capability.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use karabeat_core::{AudioDecoder, DecodedAudio, KaraError};

/// Decodes any container symphonia can probe, downmixing to mono f32.
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8]) -> karabeat_core::Result<DecodedAudio> {
        let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
        let format_opts = FormatOptions {
            enable_gapless: false,
            ..Default::default()
        };
        let probed = symphonia::default::get_probe()
            .format(&Hint::new(), stream, &format_opts, &MetadataOptions::default())
            .map_err(|e| KaraError::Audio(format!("unrecognised container: {e}")))?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| KaraError::Audio("no audio track found".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| KaraError::Audio(format!("unsupported codec: {e}")))?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count())
            .unwrap_or(1)
            .max(1);

        let mut samples = Vec::new();
        while let Ok(packet) = format.next_packet() {
            if packet.track_id() != track_id {
                continue;
            }
            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut buffer =
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    buffer.copy_interleaved_ref(decoded);
                    if channels > 1 {
                        for frame in buffer.samples().chunks(channels) {
                            samples.push(frame.iter().sum::<f32>() / channels as f32);
                        }
                    } else {
                        samples.extend_from_slice(buffer.samples());
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "skipping undecodable packet");
                    continue;
                }
            }
        }

        if samples.is_empty() {
            return Err(KaraError::Audio("no decodable audio packets".to_string()));
        }

        Ok(DecodedAudio {
            sample_rate,
            channels: 1,
            samples,
        })
    }
}
