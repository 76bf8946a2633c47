use std::time::Instant;

use crate::Result;

/// PCM samples handed back by a decode capability.
#[derive(Debug, Clone, Default)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples; mono decoders hand back one channel.
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let frames = self.samples.len() / self.channels.max(1) as usize;
        frames as f64 / self.sample_rate as f64
    }
}

/// Opaque audio-decode capability. The core never links a codec; the
/// application provides one of these.
pub trait AudioDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio>;
}

/// Wall-clock playback tracker. The position is always derived from the
/// captured start pair plus elapsed time, never accumulated, so timer jitter
/// cannot drift.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    started: Instant,
    media_start: f64,
}

impl PlaybackClock {
    pub fn start_at(media_start: f64) -> Self {
        Self {
            started: Instant::now(),
            media_start,
        }
    }

    pub fn media_start(&self) -> f64 {
        self.media_start
    }

    pub fn position(&self) -> f64 {
        self.media_start + self.started.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_accounts_for_channel_count() {
        let mono = DecodedAudio {
            sample_rate: 100,
            channels: 1,
            samples: vec![0.0; 250],
        };
        assert!((mono.duration_seconds() - 2.5).abs() < 1e-9);

        let stereo = DecodedAudio {
            sample_rate: 100,
            channels: 2,
            samples: vec![0.0; 250],
        };
        assert!((stereo.duration_seconds() - 1.25).abs() < 1e-9);

        let empty = DecodedAudio::default();
        assert_eq!(empty.duration_seconds(), 0.0);
    }

    #[test]
    fn clock_position_starts_at_the_media_offset() {
        let clock = PlaybackClock::start_at(12.0);
        let position = clock.position();
        assert!(position >= 12.0);
        assert!(position < 12.5);
    }
}
