use flourish_clip::events::{EventPayload, EventWindow};
use flourish_clip::sweep::{BasicTrailColors, SweepCapture, SweepParameters, PartTipSampler};
use flourish_clip::{AnimClip, ClipCache, ClipInstance, Color, Rect, SweepPointCollection, SweepRibbon};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const DOCUMENT: &str = r#"{
    "Name": "Lunge",
    "Length": 1.0,
    "Bounds": { "x": -1, "y": -2, "width": 2, "height": 4 },
    "ExportTimeUTC": "2024-03-01T12:30:00Z",
    "Parts": [
        {
            "ID": 10,
            "Path": "Body",
            "TexturePath": "Things/Body",
            "Curves": {
                "Transform.m_LocalPosition.x": { "Keyframes": [
                    { "time": 0, "value": 0, "inTangent": 0, "outTangent": 2 },
                    { "time": 1, "value": 2, "inTangent": 2, "outTangent": 0 }
                ] }
            },
            "SomeFutureKey": true
        },
        {
            "ID": 11,
            "Path": "Body/Sword",
            "CustomName": "Sword",
            "ParentID": 10,
            "TransparentByDefault": true,
            "DefaultValues": { "Transform.m_LocalPosition.z": 1 },
            "SplitDrawPivotPartID": 10,
            "SweepPaths": [[
                { "Time": 0.0, "X": 0, "Z": 1, "DX": 0, "DZ": 1 },
                { "Time": 0.5, "X": 1, "Z": 1, "DX": 0, "DZ": 1 },
                { "Time": 1.0, "X": 2, "Z": 1, "DX": 0, "DZ": 1, "Disable": true }
            ]]
        }
    ],
    "Events": [
        { "Time": 0.0, "Data": "CamShakeEvent;3" },
        { "Time": 0.5, "Data": "PuntPawn;1;True" },
        { "Time": 0.75, "Data": "Teleport;1" },
        { "Time": 1.0, "Data": "DuelEvent;AtEnd" }
    ]
}"#;

fn clip() -> AnimClip {
    AnimClip::from_json_str(DOCUMENT).unwrap()
}

#[test]
fn test_full_document_loads() {
    let _ = env_logger::builder().is_test(true).try_init();
    let clip = clip();

    assert_eq!(clip.name(), "Lunge");
    assert_eq!(clip.duration(), 1.0);
    assert_eq!(clip.bounds(), Rect::new(-1.0, -2.0, 2.0, 4.0));
    assert_eq!(
        clip.export_time_utc().map(|t| t.to_rfc3339()),
        Some("2024-03-01T12:30:00+00:00".to_string())
    );
    assert_eq!(clip.parts().len(), 2);

    let sword = clip.part_by_name("Sword").unwrap();
    let body = clip.part_by_name("Body").unwrap();
    assert_eq!(sword.parent(), Some(body.handle()));
    assert_eq!(sword.split_draw_pivot(), Some(body.handle()));
    assert!(sword.transparent_by_default());
    assert_eq!(body.children(), &[sword.handle()]);
    assert_eq!(clip.root_parts().count(), 1);

    // The unknown event kind is dropped, the rest keep their order
    let ids: Vec<_> = clip.events().iter().map(|e| e.identifier()).collect();
    assert_eq!(ids, vec!["CamShakeEvent", "PuntPawn", "DuelEvent"]);
    assert_eq!(clip.sweep_data_count(), 1);
}

#[test]
fn test_events_by_window() {
    let clip = clip();
    let first: Vec<_> = clip
        .events_in_window(EventWindow::new(0.0, 0.5))
        .map(|e| e.identifier())
        .collect();
    assert_eq!(first, vec!["CamShakeEvent", "PuntPawn"]);

    let later: Vec<_> = clip
        .events_in_window(EventWindow::new(0.5, 1.0))
        .map(|e| e.identifier())
        .collect();
    assert_eq!(later, vec!["DuelEvent"]);

    let instance = ClipInstance::new(Arc::new(clip));
    assert_eq!(instance.events_between(1.0, 0.4).count(), 2);

    let punt = instance.events_between(0.4, 0.6).next().unwrap();
    assert!(matches!(&punt.payload, EventPayload::PuntPawn(p) if p.pawn_index == 1 && p.right));
}

#[test]
fn test_sweep_velocities_from_document() {
    let clip = clip();
    let sword = clip.part_by_name("Sword").unwrap().handle();
    let paths = clip.sweep_paths(sword);
    assert_eq!(paths.len(), 1);

    let derived = paths[0].clone_with_velocities(0.5, 0.5);
    assert_eq!(derived[0].velocity_top, 0.0);
    assert!((derived[1].velocity_top - 2.0).abs() < 1e-5);
    assert!((derived[1].velocity_bottom - 2.0).abs() < 1e-5);
    // Gap samples carry no velocity
    assert_eq!(derived[2].velocity_top, 0.0);

    let runs: Vec<_> = SweepPointCollection::segments(&derived).collect();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].len(), 2);

    let mut ribbon = SweepRibbon::new(&paths[0], 0.5, 0.5);
    ribbon.update(1.0);
    let mesh = ribbon.build_mesh(&BasicTrailColors::default(), Color::WHITE);
    assert_eq!(mesh.quad_count(), 1);
}

#[test]
fn test_capture_from_clip() {
    let clip = Arc::new(clip());
    let sword = clip.part_by_name("Sword").unwrap().handle();
    let sampler = PartTipSampler::new(ClipInstance::new(Arc::clone(&clip)), sword).unwrap();
    let params = SweepParameters {
        target_distance: 0.2,
        ..Default::default()
    };

    let points = SweepCapture::new(sampler, params)
        .unwrap()
        .capture_with_post_processing()
        .unwrap();
    assert!(points.len() > 3);
    assert_eq!(points[0].time, 0.0);
    assert!((points[0].z - 1.0).abs() < 1e-5);
    assert!(points.windows(2).all(|w| w[1].time > w[0].time));
    assert!(points.iter().all(|p| !p.disable));
}

#[test]
fn test_cache_shares_by_path() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(DOCUMENT.as_bytes()).unwrap();

    let cache = ClipCache::new();
    let a = cache.load(file.path()).unwrap();
    let b = cache.load(file.path()).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(cache.contains(file.path()));
    assert_eq!(cache.statistics().hit_rate(), 0.5);

    // Instances over the shared clip keep separate overrides
    let sword = a.part_by_name("Sword").unwrap().handle();
    let mut first = ClipInstance::new(Arc::clone(&a));
    let second = ClipInstance::new(b);
    first.override_mut(sword).unwrap().prevent_draw = true;
    assert!(second.override_for(sword).unwrap().is_none());
}

#[test]
fn test_broken_references_fail_to_load() {
    let missing = DOCUMENT.replace("\"ParentID\": 10", "\"ParentID\": 99");
    assert!(matches!(
        AnimClip::from_json_str(&missing),
        Err(flourish_clip::ClipError::MissingPartReference { referenced_id: 99, .. })
    ));

    let duplicate = DOCUMENT.replace("\"ID\": 11", "\"ID\": 10");
    assert!(matches!(
        AnimClip::from_json_str(&duplicate),
        Err(flourish_clip::ClipError::DuplicatePartId(10))
    ));
}
