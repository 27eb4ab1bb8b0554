use alscene::{
    AudioEngine, FilterPreset, PlayOptions, ReverbPreset, SceneDesc, SoftwareBackend, SoundScene,
    Vec3,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(50);

/// Walks the listener past a looping sound while firing oneshots, then tears the scene
/// down.
pub fn run(ambience: &str, oneshot: &str) -> Result<()> {
    let desc = SceneDesc::default()
        .max_oneshots(20)
        .mute_distance(12.0);
    let backend = Arc::new(SoftwareBackend::new(desc.sample_rate));
    let scene = SoundScene::with_backend(desc.clone(), backend.clone());

    let mut engine = AudioEngine::for_backend(&desc, backend);
    engine.start().context("failed to open the output device")?;

    scene.create_global_effect("room", &ReverbPreset::Room.params().into())?;

    let source = Vec3::new(0.0, 0.0, -4.0);
    let looped = scene
        .play_positioned(ambience, source, PlayOptions::looped().volume(0.7))
        .with_context(|| format!("cannot play {}", ambience))?;
    log::info!("Looping {} at {:?}", ambience, looped.position());

    // 8 seconds, walking from x = -20 to x = 20 past the source
    let frames = 160;
    for frame in 0..frames {
        let x = -20.0 + 40.0 * frame as f32 / frames as f32;
        scene.update_listener(Vec3::new(x, 0.0, 0.0))?;

        if frame % 10 == 0 {
            let pitch = 0.8 + 0.4 * (frame % 30) as f32 / 30.0;
            scene.play_oneshot(oneshot, 0.5, pitch, None);
        }
        if frame == frames / 2 {
            let applied = scene.apply_environmental_filter(FilterPreset::Muffled)?;
            log::info!("Muffled {} sound(s)", applied);
        }
        if frame % 40 == 0 {
            let stats = scene.stats();
            log::info!(
                "x = {:.1}: distance {:.1}, muted {}, {} oneshot(s), {} eviction(s)",
                x,
                looped.distance_to_listener().unwrap_or_default(),
                looped.is_distance_muted(),
                stats.oneshots.active,
                stats.oneshots.evictions
            );
        }

        scene.cleanup();
        thread::sleep(FRAME);
    }

    scene.destroy_all();
    engine.stop();
    log::info!(
        "Done after {} frames of audio",
        engine.frames_processed()
    );
    Ok(())
}
