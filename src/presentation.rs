//! Read-only frame snapshots for a renderer
//!
//! Nothing here touches the simulation; a renderer (or the headless driver)
//! calls [`GameScreen::frame`] after `update` and draws what it gets.

use glam::Vec2;
use serde::Serialize;

use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{GameScreen, Locomotion, ShadowQuad};

/// Which character sprite to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpriteKind {
    Flying,
    Walking,
}

/// Camera centre in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub center: Vec2,
    /// World units visible vertically
    pub view_height: f32,
}

impl Camera {
    /// Follow `target`, offset and clamped vertically to the sky band
    pub fn follow(target: Vec2, settings: &Settings) -> Self {
        let mut center = target + settings.camera_offset;
        center.y = center.y.clamp(settings.camera_min_y, settings.camera_max_y);
        Self {
            center,
            view_height: VIEW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CharacterView {
    pub position: Vec2,
    pub angle: f32,
    /// -1 mirrors the sprite
    pub facing: f32,
    pub state: Locomotion,
    pub sprite: SpriteKind,
    pub damage: f32,
    pub fatigue: f32,
    pub sun_distance: f32,
    /// Wax reddens as it melts
    pub tint: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CloudView {
    pub id: u32,
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub shadow: ShadowQuad,
    /// Colour at the cloud edge
    pub shadow_top: [f32; 4],
    /// Colour at the far end of the shadow
    pub shadow_bottom: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TempleView {
    pub position: Vec2,
    pub is_gates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FadeView {
    /// 0 black, 1 white
    pub tone: f32,
    pub alpha: f32,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameView {
    pub camera: Camera,
    pub character: CharacterView,
    pub clouds: Vec<CloudView>,
    pub island: Vec2,
    pub temples: Vec<TempleView>,
    pub sun: Vec2,
    /// Only present while the overlay is visible
    pub fade: Option<FadeView>,
    pub sky_color: [f32; 3],
    pub sea_color: [f32; 3],
    pub sea_level: f32,
    pub world_time: f64,
    pub deaths: u32,
    /// Draw the frame-rate counter
    pub show_fps: bool,
}

/// Character colour for a damage level: white when fresh, red when melted
pub fn damage_tint(damage: f32) -> [f32; 3] {
    let d = damage.clamp(0.0, 1.0);
    [1.0, 1.0 - d, 1.0 - d]
}

impl GameScreen {
    /// Snapshot the current state for drawing
    pub fn frame(&self) -> FrameView {
        let settings = &self.settings;
        let body = self.icarus.body_state(&self.world).unwrap_or(crate::physics::BodyState {
            position: self.level.spawn,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            mass: 0.0,
        });

        let state = self.icarus.state();
        let character = CharacterView {
            position: body.position,
            angle: body.angle,
            facing: self.icarus.facing(),
            state,
            sprite: match state {
                Locomotion::Standing | Locomotion::Walking => SpriteKind::Walking,
                Locomotion::Flying | Locomotion::Falling => SpriteKind::Flying,
            },
            damage: self.icarus.damage(),
            fatigue: self.icarus.fatigue(),
            sun_distance: self.icarus.sun_distance(),
            tint: damage_tint(self.icarus.damage()),
        };

        let [r, g, b] = settings.shadow_color;
        let clouds = self
            .clouds
            .iter()
            .map(|cloud| CloudView {
                id: cloud.id,
                position: cloud.position(&self.world),
                width: cloud.width,
                height: cloud.height,
                shadow: cloud.shadow(&self.world, self.sun.position, settings.shadow_length),
                shadow_top: [r, g, b, 1.0],
                shadow_bottom: [r, g, b, 0.0],
            })
            .collect();

        let temples = self
            .temples
            .iter()
            .map(|t| TempleView {
                position: t.position,
                is_gates: t.is_gates,
            })
            .collect();

        let fade = self.fade.is_visible().then(|| FadeView {
            tone: self.fade.tone(),
            alpha: self.fade.alpha(),
        });

        FrameView {
            camera: Camera::follow(body.position, settings),
            character,
            clouds,
            island: self.island.sprite_position(&self.world),
            temples,
            sun: self.sun.position,
            fade,
            sky_color: settings.sky_color,
            sea_color: settings.sea_color,
            sea_level: SEA_LEVEL,
            world_time: self.world_time(),
            deaths: self.deaths,
            show_fps: settings.show_fps,
        }
    }
}
