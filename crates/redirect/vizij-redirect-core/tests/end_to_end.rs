use vizij_redirect::{
    path, ClipScope, Config, CurveBinding, CurvePayload, CurveStore, MemoryCurveStore,
    MemoryScene, ScalarKey, Session, Tracker,
};

fn blink_keys() -> CurvePayload {
    CurvePayload::Scalar(vec![
        ScalarKey::new(0.0, 0.0),
        ScalarKey::new(0.1, 100.0),
        ScalarKey::new(0.2, 0.0),
    ])
}

/// it should rewrite a renamed node's binding to its new path
#[test]
fn rename_rewrites_binding() {
    let mut scene = MemoryScene::new();
    let root = scene.add_root("Avatar");
    let hips = scene.add_child(root, "Hips");
    let arm = scene.add_child(hips, "Arm");
    scene.add_component(arm, "Transform");

    let mut store = MemoryCurveStore::new();
    let clip = store.add_clip("Wave");
    let old = CurveBinding::scalar("Hips/Arm", "Transform", "m_LocalPosition.x");
    let keys = CurvePayload::Scalar(vec![ScalarKey::new(0.0, 0.0), ScalarKey::new(1.0, 0.4)]);
    store.write_curve(clip, &old, keys.clone());

    let mut session =
        Session::start(&scene, &store, root, ClipScope::Clips(vec![clip]), Config::default())
            .expect("snapshot");

    scene.rename(arm, "Arm2");
    let seen = session.reconcile(&scene);
    assert_eq!(seen.moved, 1);
    let group = session.path_change_group("Hips/Arm").expect("tracked");
    assert_eq!(group.current_path.as_deref(), Some("Hips/Arm2"));

    let report = session.apply(&scene, &mut store).expect("apply");
    assert_eq!(report.modified, 1);
    assert_eq!(report.removed, 0);
    assert!(store.read_curve(clip, &old).is_none());
    assert_eq!(store.read_curve(clip, &old.with_path("Hips/Arm2")), Some(keys));
}

/// it should drop the curves of a deleted node when nothing replaces it
#[test]
fn delete_without_target_removes_curve() {
    let mut scene = MemoryScene::new();
    let root = scene.add_root("Avatar");
    let hips = scene.add_child(root, "Hips");
    let eye = scene.add_child(hips, "Eye");
    scene.add_component(eye, "SkinnedMeshRenderer");
    scene.set_blend_shapes(eye, ["Blink"]);

    let mut store = MemoryCurveStore::new();
    let clip = store.add_clip("Blink");
    let binding = CurveBinding::scalar("Hips/Eye", "SkinnedMeshRenderer", "blendShape.Blink");
    store.write_curve(clip, &binding, blink_keys());

    let mut session =
        Session::start(&scene, &store, root, ClipScope::Clips(vec![clip]), Config::default())
            .expect("snapshot");

    scene.destroy(eye);
    let seen = session.reconcile(&scene);
    assert_eq!(seen.deleted, 1);
    assert!(session.path_change_group("Hips/Eye").expect("tracked").is_deleted);

    let report = session.apply(&scene, &mut store).expect("apply");
    assert_eq!(report.removed, 1);
    assert_eq!(report.fixed, 0);
    assert_eq!(store.curve_count(clip), 0);
}

/// it should redirect curves of a missing node to a replacement carrying the blend shape
#[test]
fn missing_node_fixed_onto_replacement() {
    let mut scene = MemoryScene::new();
    let root = scene.add_root("Avatar");
    let hips = scene.add_child(root, "Hips");
    let eye = scene.add_child(hips, "Eye");
    scene.add_component(eye, "SkinnedMeshRenderer");
    scene.set_blend_shapes(eye, ["Blink"]);

    let mut store = MemoryCurveStore::new();
    let clip = store.add_clip("Blink");
    let binding = CurveBinding::scalar("Hips/Eye", "SkinnedMeshRenderer", "blendShape.Blink");
    store.write_curve(clip, &binding, blink_keys());

    // Eye is gone before tracking starts, so its curve is captured as missing.
    scene.destroy(eye);
    let eye2 = scene.add_child(hips, "Eye2");
    scene.add_component(eye2, "SkinnedMeshRenderer");
    scene.set_blend_shapes(eye2, ["Blink"]);

    let mut tracker = Tracker::new(Config::default());
    tracker
        .start_tracking(&scene, &store, root, ClipScope::Clips(vec![clip]))
        .expect("snapshot");
    tracker
        .assign_fix_target(&scene, "Hips/Eye", Some(eye2))
        .expect("Eye2 lies under the root");

    let session = tracker.session().expect("tracking");
    let group = session.missing_group("Hips/Eye").expect("missing group");
    let entry = group.entries().next().expect("one entry");
    assert!(entry.ready_to_fix);
    assert_eq!(
        entry.blend_shape.as_ref().and_then(|bs| bs.candidate_name.as_deref()),
        Some("Blink")
    );

    let report = tracker.apply(&scene, &mut store).expect("apply");
    assert_eq!(report.fixed, 1);
    assert_eq!(report.removed, 0);
    assert!(store.read_curve(clip, &binding).is_none());
    let fixed = CurveBinding::scalar("Hips/Eye2", "SkinnedMeshRenderer", "blendShape.Blink");
    assert_eq!(store.read_curve(clip, &fixed), Some(blink_keys()));
}

/// it should leave a group unassigned when two nodes share the missing name
#[test]
fn duplicate_names_are_ambiguous() {
    let mut scene = MemoryScene::new();
    let root = scene.add_root("Avatar");
    let left = scene.add_child(root, "Left");
    let right = scene.add_child(root, "Right");
    let a = scene.add_child(left, "Hand");
    let b = scene.add_child(right, "Hand");
    scene.add_component(a, "Light");
    scene.add_component(b, "Camera");

    let mut store = MemoryCurveStore::new();
    let clip = store.add_clip("Grab");
    store.write_curve(
        clip,
        &CurveBinding::scalar("Arm/Hand", "Transform", "m_LocalRotation.y"),
        CurvePayload::Scalar(vec![ScalarKey::new(0.0, 0.2)]),
    );

    let mut session =
        Session::start(&scene, &store, root, ClipScope::Clips(vec![clip]), Config::default())
            .expect("snapshot");
    assert_eq!(path::find_by_name(&scene, root, "Hand").len(), 2);

    let report = session.auto_match(&scene);
    assert_eq!((report.matched, report.ambiguous, report.invalid), (0, 1, 0));
    assert!(session.missing_group("Arm/Hand").expect("missing").fix_target.is_none());
}
