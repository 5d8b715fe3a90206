use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use vizij_redirect::{
    ClipScope, Config, CurveBinding, CurvePayload, CurveStore, MemoryCurveStore, MemoryScene,
    NodeHandle, ScalarKey, Session,
};

/// A root with `chains` bone chains of `depth` nodes, one clip animating every bone.
type Rig = (MemoryScene, NodeHandle, Vec<NodeHandle>, MemoryCurveStore, ClipScope);

fn rig(chains: usize, depth: usize) -> Rig {
    let mut scene = MemoryScene::new();
    let root = scene.add_root("Rig");
    let mut store = MemoryCurveStore::new();
    let clip = store.add_clip("Take");
    let mut heads = Vec::with_capacity(chains);
    for c in 0..chains {
        let mut parent = root;
        let mut path = String::new();
        for d in 0..depth {
            let name = format!("Bone{c}_{d}");
            parent = scene.add_child(parent, &name);
            if d == 0 {
                heads.push(parent);
                path = name;
            } else {
                path = format!("{path}/{name}");
            }
            for axis in ["x", "y", "z"] {
                store.write_curve(
                    clip,
                    &CurveBinding::scalar(
                        path.as_str(),
                        "Transform",
                        format!("m_LocalPosition.{axis}"),
                    ),
                    CurvePayload::Scalar(vec![
                        ScalarKey::new(0.0, 0.0),
                        ScalarKey::new(1.0, d as f32),
                    ]),
                );
            }
        }
        // one stale path per chain
        store.write_curve(
            clip,
            &CurveBinding::scalar(format!("Lost{c}"), "Transform", "m_LocalScale.x"),
            CurvePayload::Scalar(vec![ScalarKey::new(0.0, 1.0)]),
        );
    }
    (scene, root, heads, store, ClipScope::Clips(vec![clip]))
}

fn bench_snapshot_and_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("redirect/snapshot_reconcile");
    for &(chains, depth) in &[(8usize, 8usize), (32, 16)] {
        let (mut scene, root, heads, store, scope) = rig(chains, depth);
        group.throughput(Throughput::Elements((chains * depth) as u64));

        group.bench_function(BenchmarkId::new("snapshot", chains * depth), |b| {
            b.iter(|| {
                let session =
                    Session::start(&scene, &store, root, scope.clone(), Config::default()).unwrap();
                black_box(session.summary());
            });
        });

        let mut session =
            Session::start(&scene, &store, root, scope.clone(), Config::default()).unwrap();
        for (i, head) in heads.iter().enumerate() {
            scene.rename(*head, &format!("Renamed{i}"));
        }
        group.bench_function(BenchmarkId::new("reconcile", chains * depth), |b| {
            b.iter(|| black_box(session.reconcile(&scene)));
        });
    }
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("redirect/apply");
    let (mut scene, root, heads, store, scope) = rig(16, 8);
    let session = Session::start(&scene, &store, root, scope, Config::default()).unwrap();
    for (i, head) in heads.iter().enumerate() {
        scene.rename(*head, &format!("Renamed{i}"));
    }
    group.bench_function("rename_16x8", |b| {
        b.iter(|| {
            let mut store = store.clone();
            let report = session.clone().apply(&scene, &mut store).unwrap();
            black_box(report);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_snapshot_and_reconcile, bench_apply);
criterion_main!(benches);
