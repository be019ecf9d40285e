use approx::assert_abs_diff_eq;
use marionette_animation_core::{
    parse_clip_json, AnimationError, Config, Engine, EngineEvent, GenerationRequest, LoopMode,
    MotionType,
    PhysicsPropertiesUpdate, PlaybackState, Skeleton, SkeletonDescriptor, Vec2,
};
use marionette_test_fixtures as fixtures;

const FRAME: f32 = 1.0 / 60.0;

fn engine_with_walk(cfg: Config) -> Engine {
    let mut eng = Engine::new(cfg).unwrap();
    let clip = eng
        .generate_clip(&GenerationRequest::new(MotionType::Walk))
        .unwrap();
    eng.load_clip(clip).unwrap();
    eng
}

fn caped_troll_engine(cfg: Config) -> Engine {
    let desc: SkeletonDescriptor = fixtures::skeletons::load("caped_troll").unwrap();
    Engine::with_skeleton(cfg, Skeleton::from_descriptor(&desc).unwrap()).unwrap()
}

#[test]
fn rejects_invalid_config() {
    let cfg = Config {
        max_substeps: 0,
        ..Config::default()
    };
    assert!(matches!(
        Engine::new(cfg),
        Err(AnimationError::InvalidParameter { .. })
    ));
}

/// it should report nothing and touch nothing without a clip
#[test]
fn idle_without_clip() {
    let mut eng = Engine::new(Config::default()).unwrap();
    let before = eng.positions().to_vec();
    eng.play();
    assert_eq!(eng.state(), PlaybackState::Stopped);
    assert!(eng.update(FRAME).is_empty());
    assert_eq!(eng.positions(), &before[..]);
    assert!(eng.sample(0.0).is_none());
    assert_eq!(eng.export("bvh").unwrap(), "");
    assert_eq!(eng.export("fbx").unwrap(), "");
}

/// it should emit control events on the next update and report every joint while playing
#[test]
fn play_pause_resume_stop() {
    let mut eng = engine_with_walk(Config::default());
    let clip_id = eng.clip().unwrap().id.clone();

    eng.play();
    let out = eng.update(FRAME);
    assert_eq!(out.events, vec![EngineEvent::PlaybackStarted { clip: clip_id }]);
    assert_eq!(out.changes.len(), 16);
    assert_eq!(out.changes[0].joint, "head");
    assert_abs_diff_eq!(eng.time(), FRAME, epsilon = 1e-6);

    eng.pause();
    assert_eq!(eng.state(), PlaybackState::Paused);
    let positions = eng.positions().to_vec();
    let time = eng.time();
    let out = eng.update(0.5);
    assert_eq!(out.events, vec![EngineEvent::PlaybackPaused]);
    assert!(out.changes.is_empty());
    eng.update(0.5);
    assert_eq!(eng.positions(), &positions[..]);
    assert_eq!(eng.time(), time);

    eng.play();
    assert_eq!(eng.update(FRAME).events, vec![EngineEvent::PlaybackResumed]);

    eng.stop();
    assert_eq!(eng.time(), 0.0);
    assert_eq!(eng.state(), PlaybackState::Stopped);
    assert_eq!(eng.update(FRAME).events, vec![EngineEvent::PlaybackStopped]);
}

#[test]
fn playback_speed_is_clamped() {
    let mut eng = engine_with_walk(Config::default());
    eng.set_playback_speed(10.0);
    assert_eq!(eng.playback_speed(), 3.0);
    eng.set_playback_speed(0.01);
    assert_eq!(eng.playback_speed(), 0.1);
    eng.set_playback_speed(f32::NAN);
    assert_eq!(eng.playback_speed(), 0.1);

    eng.set_playback_speed(2.0);
    eng.play();
    eng.update(0.25);
    assert_abs_diff_eq!(eng.time(), 0.5, epsilon = 1e-6);
}

/// it should wrap at the clip period in loop mode
#[test]
fn loops_at_period() {
    let mut eng = engine_with_walk(Config::default());
    eng.play();
    eng.update(1.0);
    let out = eng.update(1.0);
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, EngineEvent::ClipLooped { .. })));
    assert_abs_diff_eq!(eng.time(), 0.0, epsilon = 1e-5);
    assert_eq!(eng.state(), PlaybackState::Playing);
}

/// it should hold the last pose and stop in once mode
#[test]
fn once_mode_ends() {
    let mut cfg = Config::default();
    cfg.playback.loop_mode = LoopMode::Once;
    cfg.physics_enabled = false;
    let mut eng = engine_with_walk(cfg);
    eng.play();
    let out = eng.update(2.5);
    assert!(out
        .events
        .contains(&EngineEvent::PlaybackEnded { time: 2.0 }));
    assert_eq!(eng.state(), PlaybackState::Stopped);
    assert_eq!(eng.time(), 2.0);
}

/// it should cap fixed ticks per update and drop the surplus
#[test]
fn substeps_are_clamped() {
    let mut eng = engine_with_walk(Config::default());
    eng.play();
    let out = eng.update(1.0);
    let clamped = out.events.iter().find_map(|e| match e {
        EngineEvent::SubstepsClamped {
            requested,
            performed,
        } => Some((*requested, *performed)),
        _ => None,
    });
    let (requested, performed) = clamped.expect("clamp event");
    assert!(requested >= 59);
    assert_eq!(performed, 8);

    // Surplus was dropped: a normal frame afterwards runs without clamping
    let out = eng.update(FRAME);
    assert!(!out
        .events
        .iter()
        .any(|e| matches!(e, EngineEvent::SubstepsClamped { .. })));
}

/// it should run physics in fixed ticks regardless of how host time is sliced
#[test]
fn accumulator_defers_partial_ticks() {
    let mut eng = engine_with_walk(Config::default());
    eng.play();
    eng.update(1.0 / 120.0);
    assert_eq!(eng.velocity("pelvis"), Some(Vec2::ZERO));
    eng.update(1.0 / 120.0);
    let v = eng.velocity("pelvis").unwrap();
    assert!(v.y > 0.0, "gravity should have acted once: {v:?}");
}

#[test]
fn physics_toggle() {
    let mut eng = engine_with_walk(Config::default());
    eng.enable_physics(false);
    eng.play();
    eng.update(FRAME * 4.0);
    assert_eq!(eng.velocity("torso"), Some(Vec2::ZERO));

    // Reloading clears velocities and rewinds
    eng.enable_physics(true);
    eng.update(FRAME * 4.0);
    assert!(eng.velocity("torso").unwrap().y > 0.0);
    let clip = eng.clip().cloned().unwrap();
    eng.load_clip(clip).unwrap();
    assert_eq!(eng.velocity("torso"), Some(Vec2::ZERO));
    assert_eq!(eng.time(), 0.0);
    assert_eq!(eng.state(), PlaybackState::Stopped);
}

#[test]
fn physics_properties_validate() {
    let mut eng = Engine::new(Config::default()).unwrap();
    let before = *eng.physics_properties();
    let err = eng
        .set_physics_properties(PhysicsPropertiesUpdate {
            damping: Some(1.5),
            ..Default::default()
        })
        .unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(*eng.physics_properties(), before);

    eng.set_physics_properties(PhysicsPropertiesUpdate {
        gravity: Some(0.0),
        stiffness: Some(1.0),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(eng.physics_properties().gravity, 0.0);
    assert_eq!(eng.physics_properties().stiffness, 1.0);
    assert_eq!(eng.physics_properties().mass, before.mass);
}

/// it should queue muscle forces on neighbours and ignore unknown joints
#[test]
fn muscle_deformation() {
    let mut eng = Engine::new(Config::default()).unwrap();
    let rest = eng.positions().to_vec();
    eng.simulate_muscle_deformation("tail", 3.0);
    assert_eq!(eng.pending_force("head"), Some(Vec2::ZERO));
    assert_eq!(eng.positions(), &rest[..]);

    eng.simulate_muscle_deformation("neck", 3.0);
    let f = eng.pending_force("head").unwrap();
    assert_abs_diff_eq!(f.y, 3.0, epsilon = 1e-5);
    assert_eq!(eng.pending_force("left_foot"), Some(Vec2::ZERO));
}

/// it should push only cloth/fur joints with wind
#[test]
fn cloth_wind() {
    let mut eng = caped_troll_engine(Config::default());
    eng.simulate_cloth_physics(Vec2::new(4.0, 0.0));
    assert_eq!(eng.pending_force("torso"), Some(Vec2::ZERO));
    assert_abs_diff_eq!(eng.pending_force("tail_fur").unwrap().x, 4.0);

    // Cloth flag from the request drives per-tick wind during playback
    let mut eng = caped_troll_engine(Config::default());
    eng.set_wind(Vec2::new(5.0, 0.0));
    let mut req = GenerationRequest::new(MotionType::Idle);
    req.cloth_physics = true;
    let clip = eng.generate_clip(&req).unwrap();
    eng.load_clip(clip).unwrap();
    eng.play();
    eng.update(FRAME);
    assert!(eng.velocity("cape_cloth_bottom").unwrap().x > 0.0);
    assert_eq!(eng.velocity("torso").unwrap().x, 0.0);
}

#[test]
fn export_through_engine() {
    let eng = engine_with_walk(Config::default());
    let err = eng.export("fbx").unwrap_err();
    assert!(matches!(err, AnimationError::UnsupportedExportFormat { .. }));
    let bvh = eng.export("bvh").unwrap();
    assert!(bvh.starts_with("HIERARCHY\n"));
    let json = eng.export("json").unwrap();
    assert!(json.contains("\"type\": \"walk\""));
}

/// it should keep engines independent of each other
#[test]
fn engines_share_nothing() {
    let mut a = engine_with_walk(Config::default());
    let b = engine_with_walk(Config::default());
    a.play();
    a.update(0.5);
    assert_eq!(b.time(), 0.0);
    assert_eq!(b.positions(), &b.skeleton().rest_positions()[..]);
}

#[test]
fn seek_clamps_into_the_clip() {
    let mut eng = engine_with_walk(Config::default());
    eng.seek(1.25);
    assert_eq!(eng.time(), 1.25);
    eng.seek(-4.0);
    assert_eq!(eng.time(), 0.0);
    eng.seek(99.0);
    assert_eq!(eng.time(), 2.0);
    eng.seek(f32::INFINITY);
    assert_eq!(eng.time(), 2.0);
}

/// it should run a manual tick without a clip
#[test]
fn manual_tick_without_clip() {
    let cfg = Config {
        physics_enabled: false,
        ..Config::default()
    };
    let mut eng = caped_troll_engine(cfg);
    assert_eq!(eng.joint_position("torso"), Some(Vec2::new(50.0, 50.0)));
    eng.enable_cloth(true);
    eng.set_wind(Vec2::new(3.0, 0.0));
    eng.tick();
    // Physics off: the cloth push is discarded and the rig is already at rest
    assert_eq!(eng.pending_force("tail_fur"), Some(Vec2::ZERO));
    assert_eq!(eng.positions(), &eng.skeleton().rest_positions()[..]);
}

/// it should start a finished once-mode clip over from the beginning
#[test]
fn finished_clip_replays() {
    let mut cfg = Config::default();
    cfg.playback.loop_mode = LoopMode::Once;
    cfg.physics_enabled = false;
    let mut eng = engine_with_walk(cfg);
    let clip_id = eng.clip().unwrap().id.clone();
    eng.play();
    eng.update(2.5);
    assert_eq!(eng.state(), PlaybackState::Stopped);

    eng.play();
    let out = eng.update(FRAME);
    assert_eq!(out.events, vec![EngineEvent::PlaybackStarted { clip: clip_id }]);
    assert_eq!(eng.state(), PlaybackState::Playing);
    assert_abs_diff_eq!(eng.time(), FRAME, epsilon = 1e-6);
}

fn pose_json(x: f32, y: f32, rotation: f32) -> String {
    format!(
        r#"{{"position":{{"x":{x},"y":{y}}},"rotation":{rotation},"scale":{{"x":1,"y":1}}}}"#
    )
}

/// it should drive skeleton joints by name, whatever order or subset the clip uses
#[test]
fn clip_poses_follow_joint_names() {
    let frame = |n: u32| {
        format!(
            r#"{{"frame":{n},"joints":{{"torso":{},"head":{},"tail":{}}}}}"#,
            pose_json(48.0, 90.0, 15.0),
            pose_json(48.0, 10.0, 0.0),
            pose_json(0.0, 0.0, 0.0),
        )
    };
    let raw = format!(
        r#"{{"id":"reordered","name":"Reordered","type":"extracted","duration":1.0,"fps":10,"keyframes":[{},{}]}}"#,
        frame(0),
        frame(10)
    );
    let clip = parse_clip_json(&raw).unwrap();
    assert_eq!(clip.joints, vec!["torso", "head", "tail"]);

    let cfg = Config {
        physics_enabled: false,
        ..Config::default()
    };
    let mut eng = Engine::new(cfg).unwrap();
    eng.load_clip(clip).unwrap();
    eng.play();
    let out = eng.update(0.0);
    assert_eq!(out.changes.len(), 16);

    assert_eq!(eng.joint_position("torso"), Some(Vec2::new(48.0, 90.0)));
    assert_eq!(eng.joint_position("head"), Some(Vec2::new(48.0, 10.0)));
    // Joints the clip does not mention keep their rest pose
    assert_eq!(eng.joint_position("neck"), Some(Vec2::new(48.0, 35.0)));
    let torso = eng.skeleton().joint_id("torso").unwrap().index();
    assert_eq!(eng.rotations()[torso], 15.0);
    let neck = eng.skeleton().joint_id("neck").unwrap().index();
    assert_eq!(eng.rotations()[neck], 0.0);
}

/// it should refuse a clip that breaks the keyframe invariants and keep the current one
#[test]
fn invalid_clip_is_not_loaded() {
    let mut eng = engine_with_walk(Config::default());
    let mut bad = eng.clip().cloned().unwrap();
    bad.fps = 0.0;
    assert!(matches!(
        eng.load_clip(bad),
        Err(AnimationError::InvalidParameter { .. })
    ));
    assert_eq!(eng.clip().unwrap().fps, 30.0);

    let mut partial = eng.clip().cloned().unwrap();
    partial.keyframes[3].poses.pop();
    assert!(eng.load_clip(partial).is_err());
}
