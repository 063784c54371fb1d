use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kestrel::body::BodyType;
use kestrel::shape::ShapeDef;
use kestrel::{FixedNum, FixedVec2, PhysicsSettings, World, WorldConfig};

const SETTINGS_PATH: &str = "assets/physics_settings.ron";
const PILE_SEED: u64 = 0x6b65_7374;
const PILE_SIZE: usize = 120;
const DEFAULT_TICKS: u64 = 600;

fn setup_file_logging() -> Result<String, Box<dyn Error>> {
    let log_dir = PathBuf::from("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("kestrel_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    // Don't rotate during a single run
    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kestrel=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path_str)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("kestrel") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Sort by modified time (oldest first)
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

fn load_settings() -> PhysicsSettings {
    match PhysicsSettings::load(SETTINGS_PATH) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("[CONFIG] {}; using defaults with gravity", err);
            PhysicsSettings {
                gravity: (0.0, -10.0),
                ..PhysicsSettings::default()
            }
        }
    }
}

/// A walled pit with a seeded pile of boxes and balls above it.
fn build_scene(world: &mut World) -> Result<(), Box<dyn Error>> {
    let fx = FixedNum::from_num::<f32>;

    world.create_static(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::rectangle(fx(40.0), fx(1.0))])?;
    for side in [-1.0f32, 1.0] {
        world.create_static(
            FixedVec2::from_f32(side * 39.0, 20.0),
            FixedNum::ZERO,
            [ShapeDef::rectangle(fx(1.0), fx(20.0))],
        )?;
    }

    let mut rng = StdRng::seed_from_u64(PILE_SEED);
    for _ in 0..PILE_SIZE {
        let position = FixedVec2::from_f32(rng.random_range(-30.0..30.0), rng.random_range(5.0..60.0));
        let angle = fx(rng.random_range(-3.0..3.0));
        let shape = if rng.random_bool(0.5) {
            ShapeDef::circle(fx(rng.random_range(0.3..1.2)))
        } else {
            ShapeDef::rectangle(fx(rng.random_range(0.3..1.2)), fx(rng.random_range(0.3..1.2)))
        };
        world.create_dynamic(position, angle, [shape.with_restitution(fx(0.2))])?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let log_file = setup_file_logging()?;

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Kestrel physics demo - Logging to file                  ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<45} ║", log_file);
    println!("╚══════════════════════════════════════════════════════════╝");

    let ticks = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TICKS);

    let config = WorldConfig::try_from(load_settings())?;
    let tick_rate = config.tick_rate;
    let mut world = World::new(config);
    build_scene(&mut world)?;
    info!("[DEMO] Scene ready: {} bodies, running {} ticks", world.body_count(), ticks);

    let checkpoint = ticks / 2;
    let mut snapshot = None;
    let mut checksums = Vec::with_capacity(ticks as usize);

    let start = std::time::Instant::now();
    for _ in 0..ticks {
        if world.tick() == checkpoint {
            snapshot = Some(world.snapshot());
        }
        world.update();
        checksums.push(world.checksum());
        if world.tick() % tick_rate.max(1.0) as u64 == 0 {
            info!(
                "[DEMO] Tick {} | checksum {:016x} | manifolds {}",
                world.tick(),
                world.checksum(),
                world.manifold_count()
            );
        }
    }
    let elapsed = start.elapsed();
    info!(
        "[DEMO] Simulated {} ticks in {:?} ({:?}/tick)",
        ticks,
        elapsed,
        elapsed / ticks.max(1) as u32
    );

    // Rewind to the checkpoint and replay; the checksums must match
    if let Some(snapshot) = snapshot {
        let bytes = snapshot.to_bytes()?;
        let decoded = kestrel::world::WorldSnapshot::from_bytes(&bytes)?;
        world.restore(&decoded)?;
        info!("[DEMO] Replaying from tick {} ({} snapshot bytes)", checkpoint, bytes.len());

        let mut diverged = false;
        while world.tick() < ticks {
            world.update();
            let expected = checksums[(world.tick() - 1) as usize];
            if world.checksum() != expected {
                warn!("[DEMO] Replay diverged at tick {}", world.tick());
                diverged = true;
                break;
            }
        }
        if !diverged {
            info!("[DEMO] Replay matched all {} checksums", ticks - checkpoint);
        }
    }

    // A blast in the middle of the pile
    let dynamic_only = |body: &kestrel::Body| body.body_type() == BodyType::Dynamic;
    let static_only = |body: &kestrel::Body| body.body_type() == BodyType::Static;
    let hits = world.perform_explosion(
        FixedVec2::from_f32(0.0, 3.0),
        FixedNum::from_num(12),
        64,
        Some(&dynamic_only),
        Some(&static_only),
        0,
        |_| {},
    )?;
    info!("[DEMO] Explosion reached {} ray/target pairs", hits);

    Ok(())
}
