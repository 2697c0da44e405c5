use super::*;

#[test]
fn empty_document_is_all_defaults() {
    assert_eq!(PipelineConfig::from_json("{}").unwrap(), PipelineConfig::default());
}

#[test]
fn partial_documents_override_fields() {
    let cfg = PipelineConfig::from_json(
        r#"{
            "detector": {"pause_threshold": 1.0},
            "llm": {"enabled": false, "model": "local"},
            "cache": {"in_memory": true, "ttls": {"code_gen_ms": 5}},
            "render": {"width": 640, "height": 360},
            "style": {"color": "red"},
            "parallel": true,
            "threads": 4,
            "unknown": 1
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.detector.pause_threshold, 1.0);
    assert_eq!(cfg.detector.max_scene_len, 8.0);
    assert!(!cfg.llm.enabled);
    assert_eq!(cfg.llm.api_key_env, "OPENAI_API_KEY");
    assert_eq!(cfg.cache.ttls.code_gen_ms, 5);
    assert_eq!(cfg.cache.ttls.transcription_ms, crate::cache::content::DEFAULT_TTL_MS);
    assert_eq!(cfg.render.frame_rate, 30);
    assert_eq!(cfg.style.color.as_deref(), Some("red"));
    assert!(cfg.parallel);
    assert_eq!(cfg.threads, Some(4));
    assert!(!cfg.captions.enabled);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(matches!(
        PipelineConfig::from_json("{not json"),
        Err(ManimlineError::Serde(_))
    ));
    for bad in [
        r#"{"detector": {"max_scene_len": 0}}"#,
        r#"{"detector": {"pause_threshold": -1}}"#,
        r#"{"llm": {"timeout_ms": 0}}"#,
        r#"{"render": {"frame_rate": 0}}"#,
        r#"{"threads": 0}"#,
        r#"{"captions": {"font_size": 0}}"#,
        r#"{"captions": {"color": "plaid"}}"#,
    ] {
        assert!(
            matches!(PipelineConfig::from_json(bad), Err(ManimlineError::Validation(_))),
            "{bad}"
        );
    }
}

#[test]
fn files_and_caches_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    let cache_dir = dir.path().join("cache");
    std::fs::write(
        &path,
        serde_json::json!({"cache": {"dir": cache_dir}}).to_string(),
    )
    .unwrap();
    let cfg = PipelineConfig::from_path(&path).unwrap();
    let cache = cfg.cache.open().unwrap();
    assert_eq!(cache.stats().unwrap().entry_count, 0);
    assert!(cache_dir.is_dir());

    assert!(PipelineConfig::from_path(dir.path().join("missing.json")).is_err());
}
