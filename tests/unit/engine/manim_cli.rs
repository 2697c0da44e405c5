use super::*;
use crate::assemble::script::Assembler;
use crate::foundation::core::TimeSpan;
use crate::scene::model::SceneDraft;
use crate::scene::timeline::Timeline;

fn plan() -> RenderPlan {
    let mut tl = Timeline::new();
    tl.add(
        SceneDraft::new("dot")
            .span(TimeSpan::new(0.0, 1.0).unwrap())
            .code("self.add(Dot())"),
    )
    .unwrap();
    Assembler::default().compose(&tl).unwrap()
}

#[test]
fn missing_program_is_reported_after_writing_the_script() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ManimCliEngine::new(dir.path().join("out"))
        .with_program(dir.path().join("no-such-manim"));
    let err = engine.render(&plan()).unwrap_err();
    assert!(err.to_string().contains("failed to spawn"), "{err}");
    let written = std::fs::read_to_string(engine.script_path()).unwrap();
    assert_eq!(written, plan().script);
}

#[cfg(unix)]
#[test]
fn failing_program_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ManimCliEngine::new(dir.path()).with_program("false");
    let err = engine.render(&plan()).unwrap_err();
    assert!(err.to_string().contains("manim exited with"), "{err}");
}

#[cfg(unix)]
#[test]
fn success_without_video_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ManimCliEngine::new(dir.path()).with_program("true");
    let err = engine.render(&plan()).unwrap_err();
    assert!(err.to_string().contains("TimelineScene.mp4"), "{err}");
}

#[test]
fn videos_are_found_in_nested_media_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("videos/timeline_scene/480p15");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(nested.join("TimelineScene.mp4"), b"").unwrap();
    assert_eq!(
        find_file(dir.path(), "TimelineScene.mp4"),
        Some(nested.join("TimelineScene.mp4"))
    );
    assert_eq!(find_file(dir.path(), "Other.mp4"), None);
}

#[test]
fn quality_flags() {
    assert_eq!(Quality::default().flag(), "l");
    assert_eq!(Quality::FourK.flag(), "k");
}
