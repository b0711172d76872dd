//! Rodio-backed audio sink

use std::fs::File;
use std::io::BufReader;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::core::{EngineError, EngineResult};

use super::{AudioSink, Sound, CHANNEL_COUNT};

/// Plays sounds through the default output device via rodio
pub struct RodioSink {
    // keeps the output stream alive for the sinks
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sinks: Vec<Option<Sink>>,
}

impl RodioSink {
    /// Open the default audio output
    pub fn new() -> EngineResult<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| EngineError::Audio(format!("cannot open audio output: {e}")))?;
        Ok(Self {
            _stream: stream,
            handle,
            sinks: (0..CHANNEL_COUNT).map(|_| None).collect(),
        })
    }
}

impl AudioSink for RodioSink {
    fn play(&mut self, channel: usize, sound: &Sound, volume: f32) -> EngineResult<()> {
        let file = File::open(sound.path()).map_err(|e| {
            EngineError::Audio(format!(
                "cannot open sound file '{}': {e}",
                sound.path().display()
            ))
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| {
            EngineError::Audio(format!("cannot decode sound '{}': {e}", sound.name()))
        })?;
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| EngineError::Audio(format!("cannot create playback sink: {e}")))?;
        sink.set_volume(volume);
        sink.append(source);
        self.sinks[channel] = Some(sink);
        Ok(())
    }

    fn stop(&mut self, channel: usize) {
        if let Some(sink) = self.sinks[channel].take() {
            sink.stop();
        }
    }

    fn set_volume(&mut self, channel: usize, volume: f32) {
        if let Some(sink) = &self.sinks[channel] {
            sink.set_volume(volume);
        }
    }

    fn is_playing(&self, channel: usize) -> bool {
        self.sinks[channel].as_ref().is_some_and(|s| !s.empty())
    }
}
