use super::*;

#[test]
fn visual_type_wire_names_match_serde() {
    for v in VisualType::ALL {
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, format!("\"{}\"", v.as_str()));
        assert_eq!(VisualType::parse(v.as_str()), Some(v));
    }
    assert_eq!(VisualType::parse("hologram"), None);
    assert_eq!(VisualType::parse(" graph "), Some(VisualType::Graph));
}

#[test]
fn scene_def_ignores_unknown_fields_and_defaults_missing_ones() {
    let raw = r#"{"id": 4, "start_time": 1.5, "end_time": 3.0, "elements": [1, 2], "extra": true}"#;
    let def: SceneDef = serde_json::from_str(raw).unwrap();
    assert_eq!(def.id, Some(4));
    assert_eq!(def.visual_type, "auto");
    assert!(def.manim_code.is_empty());
    assert!(!def.auto_generated);
    assert_eq!(def.layer, 0);
    assert!(def.generator.is_none());
}

#[test]
fn scene_def_omits_empty_audit_fields() {
    let def = SceneDef {
        id: Some(1),
        start_time: 0.0,
        end_time: 1.0,
        prompt: String::new(),
        visual_type: "custom".to_owned(),
        manim_code: String::new(),
        auto_generated: false,
        layer: 2,
        generator: None,
        notes: Vec::new(),
        data_source: None,
    };
    let v = serde_json::to_value(&def).unwrap();
    assert!(v.get("generator").is_none());
    assert!(v.get("data_source").is_none());
    assert!(v.get("notes").is_none());
    assert_eq!(v["layer"], 2);
    assert_eq!(v["manim_code"], "");
}

#[test]
fn candidate_drafts_are_auto_generated() {
    let span = TimeSpan::new(0.0, 2.0).unwrap();
    let d = SceneDraft::candidate(span, "hello world");
    assert!(d.auto_generated);
    assert_eq!(d.timing(), Some(span));
    assert_eq!(d.prompt_text(), "hello world");
    assert!(d.code.is_empty());
}

#[test]
fn blank_data_sources_are_dropped() {
    assert_eq!(SceneDraft::new("x").data_source("  ").data_source, None);
    assert_eq!(
        SceneDraft::new("x").data_source("sales.csv").data_source.as_deref(),
        Some("sales.csv")
    );
}
