//! End-to-end rendering of a small on-disk dataset

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use localization_viewer::api::{handle, Action, Outcome, ViewerState};
use localization_viewer::render::{build_map_for_root, MarkerKind};
use localization_viewer::{BearingTriangulator, ViewerConfig, ViewerError};

fn write_record(dir: &Path, body: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("data.json"), body).unwrap();
}

/// `dataset_sdp/2`: three observers aimed at one object, plus case 4
/// which has observers but no object record.
fn dataset() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("dataset_sdp");
    let case = root.join("2");

    write_record(
        &case.join("object_records/1"),
        r#"{ "timestamp": "2025-03-01T10:00:00Z",
             "gps": { "latitude": 25.0010, "longitude": 55.0010, "altitude": 30.0 } }"#,
    );
    fs::write(case.join("object_records/1/photo.jpg"), [0xffu8, 0xd8, 0xff]).unwrap();

    let observers = [
        (1, 25.0000, 55.0000, 42.4, 8.0),
        (2, 25.0000, 55.0020, 317.6, 8.5),
        (3, 25.0020, 55.0005, 155.5, 7.5),
    ];
    for (id, lat, lon, yaw, pitch) in observers {
        write_record(
            &case.join(format!("observation_records/{}", id)),
            &format!(
                r#"{{ "gps": {{ "latitude": {}, "longitude": {}, "accuracy": 4.0 }},
                     "compass": {{ "heading": {} }},
                     "gyro": {{ "yaw_geo_north": {}, "pitch": {} }} }}"#,
                lat, lon, yaw, yaw, pitch
            ),
        );
    }

    write_record(
        &root.join("4/observation_records/1"),
        r#"{ "gps": { "latitude": 25.0, "longitude": 55.0 }, "gyro": { "yaw_geo_north": 10 } }"#,
    );
    tmp
}

#[test]
fn case_two_renders_five_markers() {
    let tmp = dataset();
    let root = tmp.path().join("dataset_sdp");
    let rendered = build_map_for_root(
        &root,
        &["2".to_string()],
        &ViewerConfig::default(),
        &BearingTriangulator::new(),
    )
    .unwrap();

    let doc = &rendered.document;
    assert_eq!(doc.markers.len(), 5);
    assert_eq!(doc.count(MarkerKind::Observer), 3);
    assert_eq!(doc.count(MarkerKind::Object), 1);
    assert_eq!(doc.count(MarkerKind::Estimate), 1);
    assert_eq!(
        doc.markers.iter().filter(|m| m.kind != MarkerKind::Estimate).count(),
        4
    );

    // Bearings were aimed at the object, so the estimate lands close to it
    let metrics = &rendered.metrics[0];
    assert_eq!(metrics.n_observers, 3);
    let error = metrics.error_m.unwrap();
    assert!(error < 10.0, "error {} m", error);

    let object = doc.markers_of(MarkerKind::Object).next().unwrap();
    let popup = object.popup_html.as_deref().unwrap();
    assert!(popup.contains("data:image/jpeg;base64,"));
    assert!(popup.contains("2025-03-01T10:00:00Z"));

    let html = rendered.to_html().unwrap();
    assert!(html.contains("Object (estimated)"));
}

#[test]
fn rendering_twice_gives_identical_markers() {
    let tmp = dataset();
    let root = tmp.path().join("dataset_sdp");
    let config = ViewerConfig::default();
    let estimator = BearingTriangulator::new();

    let first = build_map_for_root(&root, &["2".to_string()], &config, &estimator).unwrap();
    let second = build_map_for_root(&root, &["2".to_string()], &config, &estimator).unwrap();

    let coords = |r: &localization_viewer::RenderedMap| {
        r.document
            .markers
            .iter()
            .map(|m| (m.kind, m.lat, m.lon))
            .collect::<Vec<_>>()
    };
    assert_eq!(coords(&first), coords(&second));
    assert_eq!(first.to_html().unwrap(), second.to_html().unwrap());
}

#[test]
fn missing_object_record_renders_nothing() {
    let tmp = dataset();
    let root = tmp.path().join("dataset_sdp");
    let result = build_map_for_root(
        &root,
        &["4".to_string()],
        &ViewerConfig::default(),
        &BearingTriangulator::new(),
    );
    match result {
        Err(ViewerError::MissingRequiredFile { path }) => {
            assert!(path.ends_with("4/object_records/1/data.json"));
        }
        other => panic!("expected MissingRequiredFile, got {:?}", other.map(|r| r.metrics)),
    }
}

#[test]
fn whole_root_skips_broken_cases() {
    let tmp = dataset();
    let root = tmp.path().join("dataset_sdp");
    let rendered = build_map_for_root(
        &root,
        &[],
        &ViewerConfig::default(),
        &BearingTriangulator::new(),
    )
    .unwrap();
    assert_eq!(rendered.metrics.len(), 1);
    assert_eq!(rendered.metrics[0].case, "2");

    let out = tmp.path().join("results/results.geojson");
    rendered.save_geojson(&out).unwrap();
    let geojson: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(geojson["features"].as_array().unwrap().len(), 4);
}

#[test]
fn session_generate_and_clear() {
    let tmp = dataset();
    let root = tmp.path().join("dataset_sdp");
    let config = ViewerConfig::default();
    let estimator = BearingTriangulator::new();
    let mut state = ViewerState::new();

    handle(&mut state, Action::SetRoot(root), &config, &estimator).unwrap();
    assert_eq!(state.cases, vec!["2", "4"]);

    match handle(&mut state, Action::Generate, &config, &estimator).unwrap() {
        Outcome::Generated { markers, .. } => assert_eq!(markers, 5),
        other => panic!("unexpected outcome {:?}", other),
    }

    handle(&mut state, Action::SelectCase("4".into()), &config, &estimator).unwrap();
    let err = handle(&mut state, Action::Generate, &config, &estimator).unwrap_err();
    assert!(matches!(err, ViewerError::MissingRequiredFile { .. }));
    assert!(state.map.is_none());

    handle(&mut state, Action::SelectCase("2".into()), &config, &estimator).unwrap();
    handle(&mut state, Action::Generate, &config, &estimator).unwrap();
    assert!(state.map.is_some());
    handle(&mut state, Action::Clear, &config, &estimator).unwrap();
    assert!(state.map.is_none());
}
