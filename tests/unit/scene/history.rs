use super::*;
use crate::foundation::core::TimeSpan;
use crate::scene::model::{SceneDraft, SceneId, TimeEdge};

#[test]
fn undo_and_redo_walk_committed_states() {
    let mut h = EditHistory::new(Timeline::new());
    h.apply(Edit::Add(SceneDraft::new("a"))).unwrap();
    h.apply(Edit::UpdateTime {
        id: SceneId(1),
        edge: TimeEdge::End,
        value: 8.0,
    })
    .unwrap();
    assert_eq!(h.current().get(SceneId(1)).unwrap().end_time(), 8.0);

    assert!(h.undo());
    assert_eq!(h.current().get(SceneId(1)).unwrap().end_time(), 5.0);
    assert!(h.undo());
    assert!(h.current().is_empty());
    assert!(!h.undo());

    assert!(h.redo());
    assert!(h.redo());
    assert_eq!(h.current().get(SceneId(1)).unwrap().end_time(), 8.0);
    assert!(!h.redo());
}

#[test]
fn new_edit_clears_redo_and_noops_are_not_recorded() {
    let mut h = EditHistory::new(Timeline::new());
    h.apply(Edit::Add(SceneDraft::new("a"))).unwrap();
    h.apply(Edit::Remove(SceneId(77))).unwrap();
    assert!(h.undo());
    assert!(!h.undo());

    assert!(h.redo());
    assert!(h.undo());
    h.apply(Edit::Add(
        SceneDraft::new("b").span(TimeSpan::new(1.0, 2.0).unwrap()),
    ))
    .unwrap();
    assert!(!h.redo());
}

#[test]
fn failed_edits_leave_history_untouched() {
    let mut h = EditHistory::new(Timeline::new());
    assert!(
        h.apply(Edit::SetPrompt {
            id: SceneId(5),
            prompt: "x".to_owned(),
        })
        .is_err()
    );
    assert!(!h.undo());
}

#[test]
fn limit_bounds_undo_depth() {
    let mut h = EditHistory::new(Timeline::new()).with_limit(2);
    for i in 0..5 {
        h.apply(Edit::Add(SceneDraft::new(format!("s{i}")))).unwrap();
    }
    assert!(h.undo());
    assert!(h.undo());
    assert!(!h.undo());
    assert_eq!(h.into_current().len(), 3);
}
