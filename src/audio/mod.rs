//! Audio boundary
//!
//! Gameplay fires named effects and music cues; what plays them is a
//! collaborator behind `AudioService`. The shipped service logs them.
//! Tests either drop requests or use `RecordingAudio` to assert on the
//! exact sequence a frame produced.

/// Named sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sfx {
    Died,
    Jumped,
    WallJumped,
    Dashed,
    DidNotDash,
    DashReset,
    PlayerSpawnerCreated,
    PlayerSpawnerTouchedGround,
    FallFloorShakeStarted,
    FallFloorReset,
    FakeWallDestroyed,
}

/// Looping music tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Song {
    Song0,
    Song20,
    Song30,
}

/// A music request: start a song or stop the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicCue {
    Play(Song),
    Stop,
}

/// Channel mask used when none is given (all channels)
pub const ALL_CHANNELS: u8 = 0b111;

/// Sound output as seen by gameplay.
pub trait AudioService {
    /// Fire a one-shot effect.
    fn play_effect(&mut self, sfx: Sfx);

    /// Change music. A nonzero `fade_ms` crossfades from the current song.
    fn play_music(&mut self, cue: MusicCue, fade_ms: u32, channel_mask: u8);
}

/// Drops every request.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct NullAudio;

#[cfg(test)]
impl AudioService for NullAudio {
    fn play_effect(&mut self, _sfx: Sfx) {}
    fn play_music(&mut self, _cue: MusicCue, _fade_ms: u32, _channel_mask: u8) {}
}

/// Logs every request at debug level.
#[derive(Debug, Default)]
pub struct TracingAudio;

impl AudioService for TracingAudio {
    fn play_effect(&mut self, sfx: Sfx) {
        tracing::debug!(?sfx, "sfx");
    }

    fn play_music(&mut self, cue: MusicCue, fade_ms: u32, channel_mask: u8) {
        tracing::debug!(?cue, fade_ms, channel_mask, "music");
    }
}

/// One audio request, as queued by gameplay or recorded by a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    Effect(Sfx),
    Music {
        cue: MusicCue,
        fade_ms: u32,
        channel_mask: u8,
    },
}

impl AudioEvent {
    /// Hand this request to a service.
    pub fn dispatch(self, audio: &mut dyn AudioService) {
        match self {
            AudioEvent::Effect(sfx) => audio.play_effect(sfx),
            AudioEvent::Music {
                cue,
                fade_ms,
                channel_mask,
            } => audio.play_music(cue, fade_ms, channel_mask),
        }
    }
}

/// Records requests in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub events: Vec<AudioEvent>,
}

#[cfg(test)]
impl RecordingAudio {
    pub fn effects(&self) -> Vec<Sfx> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AudioEvent::Effect(s) => Some(*s),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl AudioService for RecordingAudio {
    fn play_effect(&mut self, sfx: Sfx) {
        self.events.push(AudioEvent::Effect(sfx));
    }

    fn play_music(&mut self, cue: MusicCue, fade_ms: u32, channel_mask: u8) {
        self.events.push(AudioEvent::Music {
            cue,
            fade_ms,
            channel_mask,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_replays_in_order() {
        let queued = [
            AudioEvent::Effect(Sfx::Jumped),
            AudioEvent::Music {
                cue: MusicCue::Play(Song::Song30),
                fade_ms: 500,
                channel_mask: ALL_CHANNELS,
            },
            AudioEvent::Effect(Sfx::Dashed),
        ];
        let mut rec = RecordingAudio::default();
        for event in queued {
            event.dispatch(&mut rec);
        }
        assert_eq!(rec.events, queued.to_vec());
        assert_eq!(rec.effects(), vec![Sfx::Jumped, Sfx::Dashed]);
    }
}
