//! Sound playback
//!
//! The [`SoundManager`] owns a fixed set of playback channels grouped into
//! submixes with independent volumes. Playing a sound claims an idle
//! channel; [`SoundManager::update`] returns channels whose playback has
//! finished to the idle list. Actual output goes through the [`AudioSink`]
//! trait, with a rodio-backed sink available behind the `audio` feature and
//! a silent test sink always present.

#[cfg(feature = "audio")]
mod rodio_sink;

#[cfg(feature = "audio")]
pub use rodio_sink::RodioSink;

use std::path::{Path, PathBuf};

use crate::core::{EngineError, EngineResult};

/// Number of simultaneous playback channels
pub const CHANNEL_COUNT: usize = 16;

/// Number of submix groups
pub const SUBMIX_COUNT: usize = 8;

/// A playable sound asset
#[derive(Debug, Clone)]
pub struct Sound {
    name: String,
    path: PathBuf,
    submix: usize,
}

impl Sound {
    /// Describe a sound file routed through `submix`
    pub fn new(name: &str, path: impl Into<PathBuf>, submix: usize) -> EngineResult<Self> {
        if submix >= SUBMIX_COUNT {
            return Err(EngineError::Audio(format!(
                "sound '{name}' targets submix {submix}, only {SUBMIX_COUNT} exist"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            path: path.into(),
            submix,
        })
    }

    /// Sound name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Submix this sound is routed through
    pub fn submix(&self) -> usize {
        self.submix
    }
}

/// Playback backend
///
/// Deliberately not `Send`; the sound manager lives on the main thread.
pub trait AudioSink {
    /// Start playing `sound` on `channel` at the given final volume
    fn play(&mut self, channel: usize, sound: &Sound, volume: f32) -> EngineResult<()>;

    /// Stop playback on `channel`
    fn stop(&mut self, channel: usize);

    /// Adjust the volume of a playing channel
    fn set_volume(&mut self, channel: usize, volume: f32);

    /// Whether `channel` is still producing audio
    fn is_playing(&self, channel: usize) -> bool;
}

/// Silent sink that tracks channel state without producing audio
///
/// Channels stay busy until [`NullSink::finish`] or a stop; the engine tests
/// and headless runs use this.
#[derive(Default)]
pub struct NullSink {
    playing: [bool; CHANNEL_COUNT],
}

impl NullSink {
    /// Create a sink with all channels idle
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the end of playback on `channel`
    pub fn finish(&mut self, channel: usize) {
        self.playing[channel] = false;
    }
}

impl AudioSink for NullSink {
    fn play(&mut self, channel: usize, _sound: &Sound, _volume: f32) -> EngineResult<()> {
        self.playing[channel] = true;
        Ok(())
    }

    fn stop(&mut self, channel: usize) {
        self.playing[channel] = false;
    }

    fn set_volume(&mut self, _channel: usize, _volume: f32) {}

    fn is_playing(&self, channel: usize) -> bool {
        self.playing[channel]
    }
}

struct ActiveChannel {
    sound_name: String,
    submix: usize,
    base_volume: f32,
}

/// Channel and submix bookkeeping over an audio sink
pub struct SoundManager {
    sink: Box<dyn AudioSink>,
    channels: Vec<Option<ActiveChannel>>,
    idle: Vec<usize>,
    submix_volumes: [f32; SUBMIX_COUNT],
    master_volume: f32,
}

impl SoundManager {
    /// Create a manager over `sink` with all channels idle
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            channels: (0..CHANNEL_COUNT).map(|_| None).collect(),
            // idle channels are claimed from the back
            idle: (0..CHANNEL_COUNT).rev().collect(),
            submix_volumes: [1.0; SUBMIX_COUNT],
            master_volume: 1.0,
        }
    }

    /// Play a sound on an idle channel, returning the channel index
    pub fn play(&mut self, sound: &Sound, volume: f32) -> EngineResult<usize> {
        let Some(channel) = self.idle.pop() else {
            return Err(EngineError::Audio(format!(
                "cannot play '{}', all {CHANNEL_COUNT} channels are busy",
                sound.name()
            )));
        };
        let base_volume = volume.clamp(0.0, 1.0);
        let effective = base_volume * self.submix_volumes[sound.submix()] * self.master_volume;
        if let Err(e) = self.sink.play(channel, sound, effective) {
            self.idle.push(channel);
            return Err(e);
        }
        self.channels[channel] = Some(ActiveChannel {
            sound_name: sound.name().to_string(),
            submix: sound.submix(),
            base_volume,
        });
        log::trace!("sound '{}' playing on channel {channel}", sound.name());
        Ok(channel)
    }

    /// Stop playback on one channel
    pub fn stop(&mut self, channel: usize) {
        if self.channels.get_mut(channel).and_then(Option::take).is_some() {
            self.sink.stop(channel);
            self.idle.push(channel);
        }
    }

    /// Stop playback on every channel
    pub fn stop_all(&mut self) {
        for channel in 0..CHANNEL_COUNT {
            self.stop(channel);
        }
    }

    /// Reclaim channels whose playback has finished; call once per frame
    pub fn update(&mut self) {
        for channel in 0..CHANNEL_COUNT {
            if self.channels[channel].is_some() && !self.sink.is_playing(channel) {
                self.channels[channel] = None;
                self.idle.push(channel);
            }
        }
    }

    /// Set the volume of a submix, reapplying it to its playing channels
    pub fn set_submix_volume(&mut self, submix: usize, volume: f32) -> EngineResult<()> {
        if submix >= SUBMIX_COUNT {
            return Err(EngineError::Audio(format!(
                "submix {submix} out of range, only {SUBMIX_COUNT} exist"
            )));
        }
        self.submix_volumes[submix] = volume.clamp(0.0, 1.0);
        self.reapply_volumes();
        Ok(())
    }

    /// Set the master volume applied on top of submix volumes
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        self.reapply_volumes();
    }

    fn reapply_volumes(&mut self) {
        for (channel, active) in self.channels.iter().enumerate() {
            if let Some(active) = active {
                let effective =
                    active.base_volume * self.submix_volumes[active.submix] * self.master_volume;
                self.sink.set_volume(channel, effective);
            }
        }
    }

    /// Number of channels currently playing
    pub fn occupied_count(&self) -> usize {
        CHANNEL_COUNT - self.idle.len()
    }

    /// Number of channels available for playback
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Name of the sound playing on `channel`, if any
    pub fn playing_on(&self, channel: usize) -> Option<&str> {
        self.channels
            .get(channel)?
            .as_ref()
            .map(|a| a.sound_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beep(submix: usize) -> Sound {
        Sound::new("beep", "sounds/beep.wav", submix).unwrap()
    }

    #[test]
    fn play_claims_and_update_reclaims_channels() {
        let mut manager = SoundManager::new(Box::new(NullSink::new()));
        let channel = manager.play(&beep(0), 1.0).unwrap();
        assert_eq!(manager.occupied_count(), 1);
        assert_eq!(manager.playing_on(channel), Some("beep"));

        // nothing finished yet
        manager.update();
        assert_eq!(manager.occupied_count(), 1);

        manager.stop(channel);
        assert_eq!(manager.occupied_count(), 0);
        assert_eq!(manager.idle_count(), CHANNEL_COUNT);
    }

    #[test]
    fn all_channels_busy_is_an_error() {
        let mut manager = SoundManager::new(Box::new(NullSink::new()));
        for _ in 0..CHANNEL_COUNT {
            manager.play(&beep(0), 1.0).unwrap();
        }
        assert!(manager.play(&beep(0), 1.0).is_err());
        manager.stop_all();
        assert!(manager.play(&beep(0), 1.0).is_ok());
    }

    #[test]
    fn invalid_submix_is_rejected() {
        assert!(Sound::new("bad", "x.wav", SUBMIX_COUNT).is_err());
        let mut manager = SoundManager::new(Box::new(NullSink::new()));
        assert!(manager.set_submix_volume(SUBMIX_COUNT, 0.5).is_err());
    }

    #[test]
    fn double_stop_does_not_corrupt_idle_list() {
        let mut manager = SoundManager::new(Box::new(NullSink::new()));
        let channel = manager.play(&beep(1), 0.5).unwrap();
        manager.stop(channel);
        manager.stop(channel);
        assert_eq!(manager.idle_count(), CHANNEL_COUNT);
    }
}
