use vizij_redirect::{
    ClipScope, Config, CurveBinding, CurvePayload, CurveStore, MemoryCurveStore, MemoryScene,
    ScalarKey, Tracker,
};

fn main() -> anyhow::Result<()> {
    // A small rig: Avatar/Hips/{Arm, Head}
    let mut scene = MemoryScene::new();
    let root = scene.add_root("Avatar");
    let hips = scene.add_child(root, "Hips");
    let arm = scene.add_child(hips, "Arm");
    let head = scene.add_child(hips, "Head");

    // One clip animating the arm plus a curve whose node no longer exists.
    let mut store = MemoryCurveStore::new();
    let clip = store.add_clip("Wave");
    let keys = CurvePayload::Scalar(vec![ScalarKey::new(0.0, 0.0), ScalarKey::new(1.0, 0.5)]);
    store.write_curve(
        clip,
        &CurveBinding::scalar("Hips/Arm", "Transform", "m_LocalRotation.z"),
        keys.clone(),
    );
    store.write_curve(
        clip,
        &CurveBinding::scalar("Hips/Neck", "Transform", "m_LocalRotation.x"),
        keys,
    );

    let mut tracker = Tracker::new(Config::default());
    let session = tracker.start_tracking(&scene, &store, root, ClipScope::Clips(vec![clip]))?;
    println!("tracking: {:?}", session.summary());

    // The host renames a bone and picks a replacement for the missing one.
    scene.rename(arm, "UpperArm");
    tracker.notify_hierarchy_changed();
    if let Some(report) = tracker.poll(&scene)? {
        println!("reconciled: {report:?}");
    }
    tracker.assign_fix_target(&scene, "Hips/Neck", Some(head))?;

    let report = tracker.apply(&scene, &mut store)?;
    println!("applied: {report}");
    for binding in store.bindings(clip) {
        println!("  {}:{}.{}", binding.path, binding.component_type, binding.property_name);
    }
    Ok(())
}
