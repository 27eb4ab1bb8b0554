mod common;

use alscene::{EffectKind, EffectParams, PlayOptions, SceneDesc};
use common::Harness;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_plays_share_one_buffer() {
    let h = Arc::new(Harness::new(SceneDesc::default()));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let h = h.clone();
            thread::spawn(move || {
                (0..5)
                    .filter_map(|_| h.scene.play(h.path("test.wav"), PlayOptions::looped()))
                    .count()
            })
        })
        .collect();
    let played: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();

    assert_eq!(played, 40);
    assert_eq!(h.backend.buffer_count(), 1);
    assert_eq!(h.scene.cache().len(), 1);
    let buffers: Vec<_> = h
        .scene
        .sounds()
        .iter()
        .map(|s| s.buffer().unwrap().buffer_id())
        .collect();
    assert!(buffers.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_shared_effect_outlives_its_registration() {
    let h = Harness::new(SceneDesc::default());
    let echo = h
        .scene
        .create_global_effect("echo", &EffectParams::defaults(EffectKind::Echo))
        .unwrap();
    let a = h.scene.play(h.path("test.wav"), PlayOptions::looped()).unwrap();
    let b = h.scene.play(h.path("test.wav"), PlayOptions::looped()).unwrap();
    assert_eq!(echo.owner_count(), 4);

    assert!(h.scene.remove_global_effect("echo"));
    assert_eq!(a.effect_count(), 0);
    assert_eq!(b.effect_count(), 0);
    assert_eq!(echo.owner_count(), 1);

    // still a live native object while the caller holds it
    echo.set_parameter("feedback", 0.9f32).unwrap();
    assert_eq!(h.backend.effect_count(), 1);
    drop(echo);
    assert_eq!(h.backend.effect_count(), 0);
}

#[test]
fn test_cache_clear_silences_bound_sounds() {
    let h = Harness::new(SceneDesc::default());
    let sound = h.scene.play(h.path("test.wav"), PlayOptions::looped()).unwrap();
    assert_eq!(h.scene.cache().clear(), 1);

    h.render(64);
    assert!(!sound.is_playing());
    assert_eq!(h.backend.buffer_count(), 0);
}
