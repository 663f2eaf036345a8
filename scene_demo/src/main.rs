//! Solar system demo running the scene engine headless
//!
//! A sun spins in place, planets orbit it and moons orbit the planets. Orbits are
//! expressed purely through the transform hierarchy: each body only rotates its own
//! pivot, and world positions fall out of the parent chain. A text render pass logs
//! the world positions once per simulated second.
//!
//! Usage: `solar_demo [config.toml|config.ron]`

use rand::prelude::*;
use scene_engine::prelude::*;
use std::f32::consts::TAU;

/// Rotates its entity about the local Y axis
struct Spin {
    /// Radians per second
    rate: f32,
}

impl Component for Spin {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        let angle = self.rate * ctx.time().delta;
        if let Some(mut transform) = ctx.transform_mut() {
            transform.rotate(utils::axis_angle(Vec3::y(), angle));
        }
    }
}

/// Name shown by the text pass
struct Body {
    name: String,
}

impl Component for Body {
    fn order_tag(&self) -> OrderTag {
        OrderTag::Render
    }

    fn awake(&mut self, ctx: &mut ComponentContext<'_>) {
        log::debug!("{} ({}) awake", self.name, ctx.entity());
    }
}

/// Despawns its entity after a number of seconds, like a comet burning up
struct Lifetime {
    remaining: f32,
}

impl Component for Lifetime {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        self.remaining -= ctx.time().delta;
        if self.remaining <= 0.0 {
            let entity = ctx.entity();
            log::info!("{} burned up", entity);
            ctx.destroy_entity(entity);
        }
    }
}

/// Logs every body's world position once per simulated second
struct TextPass {
    next_report: f32,
}

impl RenderPass for TextPass {
    fn tag(&self) -> OrderTag {
        OrderTag::Render
    }

    fn name(&self) -> &str {
        "text"
    }

    fn draw(&mut self, scene: &Scene, time: &FrameTime) {
        if time.total < self.next_report {
            return;
        }
        self.next_report += 1.0;

        let components = scene.components();
        if let Some(camera) = scene.main_camera().and_then(|entity| components.transform(entity)) {
            log::info!("t={:.1}s camera at {:?}", time.total, camera.world_position());
        }
        for (entity, body) in components.iter::<Body>() {
            if let Some(transform) = components.transform(entity) {
                let p = transform.world_position();
                log::info!("  {:<8} ({:7.2}, {:7.2}, {:7.2})", body.name, p.x, p.y, p.z);
            }
        }
    }
}

/// Orbit description for one body
struct Orbit {
    name: &'static str,
    radius: f32,
    period: f32,
    size: f32,
}

const PLANETS: [(Orbit, &[Orbit]); 3] = [
    (Orbit { name: "Mercury", radius: 4.0, period: 2.0, size: 0.3 }, &[]),
    (
        Orbit { name: "Earth", radius: 8.0, period: 5.0, size: 0.6 },
        &[Orbit { name: "Moon", radius: 1.5, period: 1.0, size: 0.2 }],
    ),
    (
        Orbit { name: "Jupiter", radius: 14.0, period: 12.0, size: 1.5 },
        &[
            Orbit { name: "Io", radius: 2.5, period: 0.8, size: 0.2 },
            Orbit { name: "Europa", radius: 3.5, period: 1.6, size: 0.2 },
        ],
    ),
];

struct SolarApp {
    rng: StdRng,
}

impl SolarApp {
    /// Create a pivot spinning around `parent` and a body sitting on it at `orbit.radius`
    fn add_orbit(&mut self, scene: &mut Scene, parent: Entity, orbit: &Orbit) -> Entity {
        let phase = self.rng.gen_range(0.0..TAU);
        let mut pivot = scene.create_game_object().with(Spin { rate: TAU / orbit.period });
        pivot.set_parent(Some(parent), false);
        if let Some(mut transform) = pivot.transform_mut() {
            transform.set_local_rotation(utils::axis_angle(Vec3::y(), phase));
        }
        let pivot = pivot.entity();

        let mut body = scene.create_game_object().with(Body { name: orbit.name.to_string() });
        body.set_parent(Some(pivot), false);
        if let Some(mut transform) = body.transform_mut() {
            transform.set_local_position(Vec3::new(orbit.radius, 0.0, 0.0));
            transform.set_local_scale(Vec3::new(orbit.size, orbit.size, orbit.size));
        }
        body.entity()
    }
}

impl Application for SolarApp {
    fn on_setup(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let scene = engine.scenes.get_active_scene_mut()?;

        let sun = scene
            .create_game_object()
            .with(Body { name: "Sun".to_string() })
            .with(Spin { rate: 0.2 })
            .entity();

        for (planet, moons) in &PLANETS {
            let body = self.add_orbit(scene, sun, planet);
            for moon in *moons {
                self.add_orbit(scene, body, moon);
            }
        }

        let comet = scene
            .create_game_object()
            .with(Body { name: "Comet".to_string() })
            .with(Lifetime { remaining: 3.0 })
            .entity();
        if let Some(mut transform) = scene.components_mut().transform_mut(comet) {
            transform.set_world_position(Vec3::new(-20.0, 2.0, 5.0));
        }

        let camera = scene
            .create_game_object()
            .with(Camera::perspective(60.0, 16.0 / 9.0, 0.1, 100.0))
            .entity();
        if let Some(mut transform) = scene.components_mut().transform_mut(camera) {
            transform.set_local_position(Vec3::new(0.0, 25.0, 25.0));
            transform.set_local_rotation(utils::axis_angle(Vec3::x(), -std::f32::consts::FRAC_PI_4));
        }
        scene.set_main_camera(camera);

        log::info!("Solar system ready with {} entities", scene.entity_count());
        engine.render_passes.add_pass(Box::new(TextPass { next_report: 0.0 }));
        Ok(())
    }

    fn on_close(&mut self, engine: &mut Engine) {
        if let Ok(scene) = engine.scenes.get_active_scene() {
            log::info!("Closing with {} entities in '{}'", scene.entity_count(), scene.name());
        }
    }
}

fn load_config() -> Result<EngineConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(path),
        None => Ok(EngineConfig::new("Solar Demo")
            .with_fixed_delta(1.0 / 30.0)
            .with_max_frames(300)
            .with_scene(SceneConfig::new("solar").active())),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let mut app = SolarApp { rng: StdRng::from_entropy() };
    Engine::run(config, &mut app)?;
    Ok(())
}
