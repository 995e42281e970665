use crate::constants::AUDIO_MAX_QUEUED_BYTES;
use dotmatrix::apu::SAMPLE_RATE;
use sdl2::audio::{AudioQueue, AudioSpecDesired};
use sdl2::Sdl;

/// Push-model audio sink wrapping SDL's queue. The consumer (the audio
/// device) never blocks the emulation thread; when the queued backlog
/// exceeds ~500 ms the backlog is dropped instead.
pub struct AudioOutput {
    queue: AudioQueue<f32>,
}

impl AudioOutput {
    pub fn open(sdl: &Sdl) -> Result<Self, String> {
        let audio = sdl.audio()?;
        let desired = AudioSpecDesired {
            freq: Some(SAMPLE_RATE as i32),
            channels: Some(2),
            samples: Some(1024),
        };
        let queue = audio.open_queue::<f32, _>(None, &desired)?;
        queue.resume();
        Ok(AudioOutput { queue })
    }

    /// Queues a batch of interleaved stereo samples.
    pub fn queue_samples(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        if self.queue.size() > AUDIO_MAX_QUEUED_BYTES {
            log::debug!("Audio queue over 500 ms, clearing backlog");
            self.queue.clear();
        }
        if let Err(e) = self.queue.queue_audio(samples) {
            log::warn!("Failed to queue audio: {}", e);
        }
    }
}
