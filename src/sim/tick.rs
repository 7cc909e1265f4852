//! Fixed timestep simulation tick
//!
//! Wall-clock time is fed in per rendered frame; the world only ever moves in
//! whole `SIM_DT` steps, as many as fit (possibly none).

use super::icarus::{Locomotion, StepContext};
use super::state::{ExitReason, GameScreen, TimerEvent};
use crate::audio::SoundCue;
use crate::consts::*;

/// Feed `elapsed` wall-clock seconds and run every tick that is now due.
/// Returns the number of ticks run.
pub fn advance(screen: &mut GameScreen, elapsed: f64) -> u32 {
    if !screen.is_running() {
        return 0;
    }
    screen.time += elapsed.max(0.0);

    let mut ticks = 0;
    while screen.is_running() && (screen.time_ticks + 1) as f64 * SIM_DT <= screen.time {
        tick(screen);
        ticks += 1;
    }
    ticks
}

/// Advance the screen by exactly one fixed step
pub fn tick(screen: &mut GameScreen) {
    if !screen.is_running() {
        return;
    }
    let dt = SIM_DT as f32;
    screen.time_ticks += 1;
    let now = screen.time_ticks;

    screen.fade.step(dt);

    let report = {
        let mut ctx = StepContext {
            world: &mut screen.world,
            sun: screen.sun.position,
            controls: screen.controls,
            settings: &screen.settings,
            cues: &mut screen.cues,
        };
        screen.icarus.step(&mut ctx, dt)
    };
    if report.flapped {
        screen
            .timers
            .schedule_once(now, FLAP_COOLDOWN_SECS, TimerEvent::ClearFlap);
    }

    screen.sun.step(dt);
    screen.clouds.step(&mut screen.world, screen.settings.gravity);
    screen
        .clouds
        .maintain(&mut screen.world, &mut screen.rng, &screen.settings);

    screen.world.step(
        dt,
        screen.settings.position_iterations,
        screen.settings.velocity_iterations,
    );

    check_transitions(screen);

    for event in screen.timers.drain_due(now) {
        fire(screen, event);
    }
}

/// Start the respawn or win sequence when the character's state calls for it
fn check_transitions(screen: &mut GameScreen) {
    let now = screen.time_ticks;
    let delay = screen.settings.fade_alpha_duration as f64;

    match screen.icarus.state() {
        Locomotion::Falling if !screen.respawning => {
            screen.respawning = true;
            screen.timers.schedule_once(now, delay, TimerEvent::Respawn);
            screen.fade.request(false, true);
            log::info!("Icarus fell at tick {}", now);
        }
        Locomotion::Standing if !screen.winning => {
            let y = screen.icarus.position(&screen.world).y;
            if (y - screen.level.gates.y).abs() < WIN_HEIGHT_TOLERANCE {
                screen.winning = true;
                screen.timers.schedule_once(now, delay, TimerEvent::Win);
                screen.fade.request(true, true);
                screen.push_cue(SoundCue::LevelWin);
                log::info!("Reached the pearly gates at tick {}", now);
            }
        }
        _ => {}
    }
}

fn fire(screen: &mut GameScreen, event: TimerEvent) {
    match event {
        TimerEvent::Respawn => screen.respawn(),
        TimerEvent::Win => screen.teardown(ExitReason::Won),
        TimerEvent::ClearFlap => screen.icarus.clear_flapped(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::input::Control;
    use crate::sim::state::{Level, ScreenStatus};
    use glam::Vec2;
    use proptest::prelude::*;

    /// Ticks spanned by the fade used for respawn/win delays
    fn fade_ticks(settings: &Settings) -> u64 {
        (settings.fade_alpha_duration as f64 / SIM_DT).round() as u64
    }

    fn bare_level(spawn: Vec2, gates: Vec2) -> Level {
        Level {
            spawn,
            gates,
            temples: Vec::new(),
            sky_clouds: Vec::new(),
            ..Level::reference()
        }
    }

    fn calm_settings() -> Settings {
        Settings {
            cloud_count: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_fixed_step_count() {
        let mut screen = GameScreen::new(Settings::default());
        let mut ticks = 0;
        for _ in 0..10 {
            ticks += advance(&mut screen, 0.016);
        }
        assert_eq!(ticks, (0.16 / SIM_DT).floor() as u32);
        assert_eq!(screen.time_ticks, 9);
        assert!((screen.world_time() - 9.0 * SIM_DT).abs() < 1e-12);
    }

    #[test]
    fn test_zero_ticks_for_short_frame() {
        let mut screen = GameScreen::new(Settings::default());
        assert_eq!(advance(&mut screen, 0.005), 0);
        assert_eq!(advance(&mut screen, 0.005), 0);
        assert_eq!(advance(&mut screen, 0.01), 1);
    }

    #[test]
    fn test_many_ticks_for_long_frame() {
        let mut screen = GameScreen::new(Settings::default());
        assert_eq!(advance(&mut screen, 0.51), 30);
    }

    #[test]
    fn test_screen_start_cues() {
        let mut screen = GameScreen::new(Settings::default());
        let cues = screen.drain_cues();
        assert_eq!(cues, vec![SoundCue::WindLoopStart, SoundCue::LevelStart]);
        assert!(screen.drain_cues().is_empty());
    }

    #[test]
    fn test_cloud_population_every_tick() {
        let settings = Settings {
            cloud_count: 8,
            cloud_max_x: 12.0,
            cloud_min_dx: 4.0,
            cloud_max_dx: 6.0,
            ..Default::default()
        };
        let mut screen = GameScreen::with_level(
            settings.clone(),
            bare_level(Vec2::new(2.0, 1.5), Vec2::new(10.0, 90.0)),
        );
        assert_eq!(screen.clouds.drifting_count(), 8);
        for _ in 0..300 {
            tick(&mut screen);
            assert_eq!(screen.clouds.drifting_count(), 8);
        }
    }

    #[test]
    fn test_respawn_after_fade() {
        let settings = calm_settings();
        // Over open sea: drops below the waterline within a few ticks
        let spawn = Vec2::new(20.0, 0.3);
        let mut screen =
            GameScreen::with_level(settings.clone(), bare_level(spawn, Vec2::new(10.0, 90.0)));
        let first = screen.icarus.body();

        let mut fell_at = None;
        for _ in 0..120 {
            tick(&mut screen);
            if screen.icarus.state() == Locomotion::Falling {
                fell_at = Some(screen.time_ticks);
                break;
            }
        }
        let fell_at = fell_at.expect("character never fell");
        assert!(screen.respawning);

        let due = fell_at + fade_ticks(&settings);
        while screen.time_ticks < due - 1 {
            tick(&mut screen);
            assert_eq!(screen.icarus.body(), first);
        }
        tick(&mut screen);
        assert_eq!(screen.time_ticks, due);
        assert_ne!(screen.icarus.body(), first);
        assert!(!screen.world.contains(first));
        assert_eq!(screen.icarus.position(&screen.world), spawn);
        assert_eq!(screen.icarus.damage(), 0.0);
        assert_eq!(screen.icarus.fatigue(), 0.0);
        assert_eq!(screen.icarus.state(), Locomotion::Flying);
        assert_eq!(screen.deaths, 1);
        assert!(!screen.respawning);
    }

    #[test]
    fn test_win_triggers_once() {
        let settings = calm_settings();
        // Gates level with the island so standing there counts as arrival
        let mut screen = GameScreen::with_level(
            settings.clone(),
            bare_level(Vec2::new(2.0, 1.5), Vec2::new(10.0, 2.0)),
        );
        screen.drain_cues();

        tick(&mut screen);
        assert_eq!(screen.icarus.state(), Locomotion::Standing);
        assert!(screen.winning);
        assert!(screen.timers.is_scheduled(|e| *e == TimerEvent::Win));

        // Standing on the gates twice must not schedule a second win
        tick(&mut screen);
        assert_eq!(screen.timers.len(), 1);

        for _ in 2..fade_ticks(&settings) {
            tick(&mut screen);
            assert!(screen.is_running());
        }
        tick(&mut screen);
        assert_eq!(screen.status(), ScreenStatus::Exited(ExitReason::Won));

        let cues = screen.drain_cues();
        let wins = cues.iter().filter(|c| **c == SoundCue::LevelWin).count();
        assert_eq!(wins, 1);
        assert_eq!(cues.last(), Some(&SoundCue::PauseAll));
        assert!(screen.timers.is_empty());
    }

    #[test]
    fn test_menu_teardown_cancels_timers() {
        let mut screen = GameScreen::with_level(
            calm_settings(),
            bare_level(Vec2::new(20.0, 0.3), Vec2::new(10.0, 90.0)),
        );
        for _ in 0..30 {
            tick(&mut screen);
        }
        assert!(screen.timers.is_scheduled(|e| *e == TimerEvent::Respawn));

        screen.key_down(Control::Menu);
        assert_eq!(screen.status(), ScreenStatus::Exited(ExitReason::Menu));
        assert!(screen.timers.is_empty());

        let body = screen.icarus.body();
        assert_eq!(advance(&mut screen, 5.0), 0);
        assert_eq!(screen.icarus.body(), body);
    }

    /// Tick until `done` holds, returning the number of ticks taken
    fn tick_until(screen: &mut GameScreen, max: u32, done: impl Fn(&GameScreen) -> bool) -> u32 {
        for n in 1..=max {
            tick(screen);
            if done(screen) {
                return n;
            }
        }
        panic!("condition not reached within {} ticks", max);
    }

    fn flaps(cues: &[SoundCue]) -> usize {
        cues.iter().filter(|c| **c == SoundCue::Flap).count()
    }

    #[test]
    fn test_flap_not_repeated_on_reentry_during_cooldown() {
        let mut screen = GameScreen::with_level(
            calm_settings(),
            bare_level(Vec2::new(2.0, 1.5), Vec2::new(10.0, 90.0)),
        );
        tick(&mut screen);
        assert_eq!(screen.icarus.state(), Locomotion::Standing);
        screen.drain_cues();

        // Hop: take off, then drop back onto the island
        screen.key_down(Control::Up);
        tick(&mut screen);
        assert_eq!(screen.icarus.state(), Locomotion::Flying);
        assert_eq!(flaps(&screen.drain_cues()), 1);
        for _ in 0..4 {
            tick(&mut screen);
        }
        screen.key_up(Control::Up);
        let elapsed = 5 + tick_until(&mut screen, 50, |s| s.icarus.state() == Locomotion::Standing);

        // Second take-off inside the cooldown stays silent
        assert!(screen.icarus.flap_cooling_down());
        assert!(elapsed < 60);
        screen.key_down(Control::Up);
        tick(&mut screen);
        assert_eq!(screen.icarus.state(), Locomotion::Flying);
        screen.key_up(Control::Up);
        tick_until(&mut screen, 50, |s| s.icarus.state() == Locomotion::Standing);
        assert_eq!(flaps(&screen.drain_cues()), 0);

        // Once the cooldown timer fires, taking off flaps again
        tick_until(&mut screen, 60, |s| !s.icarus.flap_cooling_down());
        assert_eq!(screen.icarus.state(), Locomotion::Standing);
        screen.key_down(Control::Up);
        tick(&mut screen);
        assert_eq!(screen.icarus.state(), Locomotion::Flying);
        assert_eq!(flaps(&screen.drain_cues()), 1);
        assert!(screen.timers.is_scheduled(|e| *e == TimerEvent::ClearFlap));
    }

    #[test]
    fn test_flap_cooldown_clears_after_a_second() {
        let mut screen = GameScreen::with_level(
            calm_settings(),
            bare_level(Vec2::new(0.0, 50.0), Vec2::new(10.0, 90.0)),
        );
        screen.key_down(Control::Up);
        tick(&mut screen);
        assert!(screen.icarus.flap_cooling_down());

        let cooldown = (FLAP_COOLDOWN_SECS / SIM_DT).round() as u64;
        for _ in 1..cooldown {
            tick(&mut screen);
        }
        assert!(screen.icarus.flap_cooling_down());
        tick(&mut screen);
        assert!(!screen.icarus.flap_cooling_down());
    }

    #[test]
    fn test_fade_out_on_fall() {
        let mut screen = GameScreen::with_level(
            calm_settings(),
            bare_level(Vec2::new(20.0, 0.3), Vec2::new(10.0, 90.0)),
        );
        for _ in 0..60 {
            tick(&mut screen);
            if screen.respawning {
                break;
            }
        }
        assert!(screen.respawning);
        let before = screen.fade.alpha();
        for _ in 0..10 {
            tick(&mut screen);
        }
        assert!(screen.fade.alpha() > before);
    }

    proptest! {
        #[test]
        fn ticks_match_elapsed_time(frames in proptest::collection::vec(0.0f64..0.05, 1..40)) {
            let mut screen = GameScreen::with_level(
                calm_settings(),
                bare_level(Vec2::new(2.0, 1.5), Vec2::new(10.0, 90.0)),
            );
            let mut total = 0u32;
            for frame in &frames {
                total += advance(&mut screen, *frame);
                prop_assert!(screen.world_time() <= screen.time + 1e-12);
                prop_assert!(screen.time - screen.world_time() < SIM_DT);
            }
            prop_assert_eq!(total as u64, screen.time_ticks);
        }
    }
}
