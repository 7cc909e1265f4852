//! Icarus headless entry point
//!
//! Runs a game screen without a window: frames are simulated at a fixed
//! rate, an autopilot holds the controls, and sound cues go to the log.

use std::path::PathBuf;

use clap::Parser;
use icarus::audio::{AudioManager, LogBackend};
use icarus::sim::{Control, GameScreen, Locomotion, ScreenStatus};
use icarus::{Settings, SettingsError};

#[derive(Parser)]
#[command(name = "icarus")]
#[command(about = "Fly Icarus from the island to the pearly gates, headless")]
struct Args {
    /// Settings file (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wall-clock seconds to simulate
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,

    /// Override the cloud RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Wax never melts and fatigue never kills
    #[arg(long)]
    immortal: bool,

    /// Simulated frames per second fed to the screen
    #[arg(long, default_value_t = 50.0)]
    frame_rate: f64,

    /// Log a frame-rate counter every simulated second
    #[arg(long)]
    show_fps: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Scripted controls: flap in bursts while drifting right
struct Autopilot {
    flapping: bool,
}

impl Autopilot {
    /// Seconds per flap burst and per glide
    const BURST: f64 = 0.6;
    const GLIDE: f64 = 0.4;

    fn new() -> Self {
        Self { flapping: false }
    }

    fn drive(&mut self, screen: &mut GameScreen, time: f64) {
        let phase = time % (Self::BURST + Self::GLIDE);
        let flap = phase < Self::BURST;
        if flap != self.flapping {
            if flap {
                screen.key_down(Control::Up);
            } else {
                screen.key_up(Control::Up);
            }
            self.flapping = flap;
        }
        if !screen.controls.right() {
            screen.key_down(Control::Right);
        }
    }
}

fn main() -> Result<(), SettingsError> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    settings.immortal |= args.immortal;
    settings.show_fps |= args.show_fps;
    settings.validate()?;

    log::info!("Icarus (headless) starting...");
    let frame_dt = 1.0 / args.frame_rate.max(1.0);
    let mut screen = GameScreen::new(settings);
    let mut audio = AudioManager::new(LogBackend);
    let mut pilot = Autopilot::new();
    let mut last_state = screen.icarus.state();
    let mut frames = 0u64;
    let mut fps_window = (0u64, 0.0f64);

    audio.play_all(screen.drain_cues());
    while screen.is_running() && (frames as f64) * frame_dt < args.seconds {
        let now = screen.world_time();
        pilot.drive(&mut screen, now);
        screen.update(frame_dt);
        audio.play_all(screen.drain_cues());
        frames += 1;

        // Refresh once per second
        if screen.settings.show_fps && screen.time - fps_window.1 >= 1.0 {
            let fps = (frames - fps_window.0) as f64 / (screen.time - fps_window.1);
            log::info!("{:.0} fps", fps);
            fps_window = (frames, screen.time);
        }

        let state = screen.icarus.state();
        if state != last_state {
            let pos = screen.icarus.position(&screen.world);
            log::info!(
                "t={:.2}s {:?} -> {:?} at ({:.1}, {:.1})",
                screen.world_time(),
                last_state,
                state,
                pos.x,
                pos.y
            );
            last_state = state;
        }
    }

    let frame = screen.frame();
    let exit = match screen.status() {
        ScreenStatus::Running => "still running".to_string(),
        ScreenStatus::Exited(reason) => format!("{:?}", reason),
    };
    log::info!(
        "Done after {} frames / {} ticks: {:?} at ({:.1}, {:.1}), damage {:.2}, fatigue {:.2}, deaths {}, exit {}",
        frames,
        screen.time_ticks,
        frame.character.state,
        frame.character.position.x,
        frame.character.position.y,
        frame.character.damage,
        frame.character.fatigue,
        screen.deaths,
        exit
    );
    if last_state == Locomotion::Falling {
        log::warn!("Icarus was falling when the run ended");
    }
    Ok(())
}
