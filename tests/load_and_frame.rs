//! End-to-end: fetch an OBJ/MTL pair, hand it to a viewport, check framing
//! and the status text a host would show.

use std::sync::mpsc;

use glam::Vec3;
use modelview::camera::framing::fit_distance;
use modelview::camera::FRAME_MARGIN;
use modelview::loader::{load_model, LoadError, LoadEvent, MemoryFetcher, ModelSource};
use modelview::options::Options;
use modelview::progress::{LoadProgress, LoadStatus};
use modelview::scene::Scene;
use modelview::Viewport;

const MTL: &str = "newmtl steel\nKd 0.5 0.5 0.6\n";

// Unit box spanning (0,0,0)..(4,2,1), top and bottom faces only.
const OBJ: &str = "mtllib box.mtl\n\
    v 0 0 0\nv 4 0 0\nv 4 0 1\nv 0 0 1\n\
    v 0 2 0\nv 4 2 0\nv 4 2 1\nv 0 2 1\n\
    usemtl steel\n\
    f 1 2 3\nf 1 3 4\nf 5 6 7\nf 5 7 8\n";

fn source() -> ModelSource {
    ModelSource::Obj {
        obj: "models/box.obj".into(),
        mtl: "models/box.mtl".into(),
    }
}

fn fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with_file("models/box.obj", OBJ.as_bytes().to_vec())
        .with_file("models/box.mtl", MTL.as_bytes().to_vec())
        .with_chunk_size(16)
}

#[test]
fn obj_model_loads_and_is_framed() {
    let mut ticks = Vec::new();
    let root = pollster::block_on(load_model(&fetcher(), &source(), &mut |p: LoadProgress| {
        ticks.push(p);
    }))
    .unwrap();

    // Only the geometry transfer is reported, in order, ending complete.
    assert!(!ticks.is_empty());
    assert!(ticks.iter().all(|p| p.total == OBJ.len() as u64));
    assert!(ticks.windows(2).all(|w| w[0].loaded < w[1].loaded));
    assert!(ticks.last().unwrap().is_complete());

    let mut viewport = Viewport::new(Options::default(), Scene::new(), (1024, 768));
    let (tx, rx) = mpsc::channel();
    viewport.attach_load(rx);
    for p in ticks {
        tx.send(LoadEvent::Progress(p)).unwrap();
    }
    tx.send(LoadEvent::Finished(Ok(root))).unwrap();
    drop(tx);
    let _ = viewport.prepare_frame((1024, 768));

    assert_eq!(viewport.status(), &LoadStatus::Ready);
    assert_eq!(
        viewport.take_status_text().as_deref(),
        Some("Done loading 3D Model!")
    );

    let bounds = viewport.model_bounds().unwrap();
    assert!((bounds.center() - Vec3::new(2.0, 1.0, 0.5)).length() < 1e-5);
    let size = bounds.size();
    let camera = viewport.camera();
    assert!((camera.target - bounds.center()).length() < 1e-5);
    assert!((camera.znear - size / 100.0).abs() < 1e-6);
    assert!((camera.zfar - size * 100.0).abs() < 1e-3);

    // Framing keeps the start pose's azimuth and drops the eye level with
    // the model center.
    let offset = camera.eye - camera.target;
    let start = Vec3::new(0.0, 10.0, 20.0) - bounds.center();
    let expected_dir = Vec3::new(start.x, 0.0, start.z).normalize();
    let distance = fit_distance(size * FRAME_MARGIN, camera.fovy);
    assert!((offset - expected_dir * distance).length() < 1e-3, "{offset:?}");
}

#[test]
fn missing_material_library_fails_the_load() {
    let fetcher = MemoryFetcher::new().with_file("models/box.obj", OBJ.as_bytes().to_vec());
    let mut ticks = 0;
    let err = pollster::block_on(load_model(&fetcher, &source(), &mut |_: LoadProgress| {
        ticks += 1;
    }))
    .unwrap_err();
    assert!(matches!(err, LoadError::Transfer(_)));
    assert_eq!(ticks, 0);

    let mut viewport = Viewport::new(Options::default(), Scene::new(), (640, 480));
    let before = *viewport.camera();
    viewport.on_load_failed(&err);
    assert!(matches!(viewport.status(), LoadStatus::Failed(_)));
    assert_eq!(*viewport.camera(), before);
    assert!(viewport.model().is_none());
}
