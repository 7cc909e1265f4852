//! Sound cue dispatch
//!
//! The simulation only names cues; an [`AudioManager`] turns them into
//! commands for whatever backend owns the audio device.

/// Sound cues fired by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Wings flap on taking off
    Flap,
    /// Footsteps loop
    WalkLoopStart,
    WalkLoopStop,
    /// Wax sizzling in the sun
    SizzleLoopStart,
    SizzleLoopStop,
    /// Ambient wind, for the whole level
    WindLoopStart,
    /// Level (re)started
    LevelStart,
    /// Reached the pearly gates
    LevelWin,
    /// Screen torn down, silence everything
    PauseAll,
}

/// Looping tracks the backend keeps alive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopTrack {
    Walk,
    Sizzle,
    Wind,
}

/// One-shot samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OneShot {
    Flap,
    LevelStart,
    LevelWin,
}

/// Audio device boundary
pub trait AudioBackend {
    fn play_once(&mut self, sound: OneShot, volume: f32);
    /// Rewind to the start and play looping
    fn start_loop(&mut self, track: LoopTrack, volume: f32);
    fn stop_loop(&mut self, track: LoopTrack);
    fn pause_all(&mut self);
}

/// Backend that only logs, for headless runs
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play_once(&mut self, sound: OneShot, volume: f32) {
        log::info!("♪ {:?} (vol {:.2})", sound, volume);
    }

    fn start_loop(&mut self, track: LoopTrack, volume: f32) {
        log::info!("♪ loop {:?} start (vol {:.2})", track, volume);
    }

    fn stop_loop(&mut self, track: LoopTrack) {
        log::info!("♪ loop {:?} stop", track);
    }

    fn pause_all(&mut self) {
        log::info!("♪ pause all");
    }
}

/// Audio manager for the game
pub struct AudioManager<B: AudioBackend> {
    backend: B,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    playing: Vec<LoopTrack>,
}

impl<B: AudioBackend> AudioManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            playing: Vec::new(),
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    pub fn is_playing(&self, track: LoopTrack) -> bool {
        self.playing.contains(&track)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Play a cue
    pub fn play(&mut self, cue: SoundCue) {
        let vol = self.effective_volume();
        match cue {
            SoundCue::Flap => self.one_shot(OneShot::Flap, vol),
            SoundCue::LevelStart => self.one_shot(OneShot::LevelStart, vol),
            SoundCue::LevelWin => self.one_shot(OneShot::LevelWin, vol),
            SoundCue::WalkLoopStart => self.start(LoopTrack::Walk, vol),
            SoundCue::WalkLoopStop => self.stop(LoopTrack::Walk),
            SoundCue::SizzleLoopStart => self.start(LoopTrack::Sizzle, vol),
            SoundCue::SizzleLoopStop => self.stop(LoopTrack::Sizzle),
            SoundCue::WindLoopStart => self.start(LoopTrack::Wind, vol),
            SoundCue::PauseAll => {
                self.playing.clear();
                self.backend.pause_all();
            }
        }
    }

    pub fn play_all(&mut self, cues: impl IntoIterator<Item = SoundCue>) {
        for cue in cues {
            self.play(cue);
        }
    }

    fn one_shot(&mut self, sound: OneShot, vol: f32) {
        if vol > 0.0 {
            self.backend.play_once(sound, vol);
        }
    }

    fn start(&mut self, track: LoopTrack, vol: f32) {
        if !self.playing.contains(&track) {
            self.playing.push(track);
        }
        // Restart from the top even if already running
        self.backend.start_loop(track, vol);
    }

    fn stop(&mut self, track: LoopTrack) {
        if let Some(i) = self.playing.iter().position(|t| *t == track) {
            self.playing.remove(i);
            self.backend.stop_loop(track);
        }
    }
}
