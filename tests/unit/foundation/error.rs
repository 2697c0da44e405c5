use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ManimlineError::malformed("x")
            .to_string()
            .contains("malformed input:")
    );
    assert!(
        ManimlineError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ManimlineError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        ManimlineError::TimelineEmpty
            .to_string()
            .contains("timeline is empty")
    );
}

#[test]
fn generation_failure_carries_scene_and_stage() {
    let err = ManimlineError::generation_failed("scene 3", Stage::Validate, "bad template");
    let s = err.to_string();
    assert!(s.contains("scene 3"));
    assert!(s.contains("validate"));
    assert!(s.contains("bad template"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ManimlineError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
