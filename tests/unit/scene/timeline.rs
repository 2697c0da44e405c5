use super::*;

fn span(a: f64, b: f64) -> TimeSpan {
    TimeSpan::new(a, b).unwrap()
}

fn human(tl: &mut Timeline, a: f64, b: f64) -> SceneId {
    tl.add(SceneDraft::new("hand placed").span(span(a, b)))
        .unwrap()
}

#[test]
fn add_without_timing_appends_five_seconds_after_last_end() {
    let mut tl = Timeline::new();
    let a = tl.add(SceneDraft::new("first")).unwrap();
    let b = tl.add(SceneDraft::new("second")).unwrap();
    assert_eq!(a, SceneId(1));
    assert_eq!(b, SceneId(2));
    let sb = tl.get(b).unwrap();
    assert_eq!(sb.start_time(), 5.0);
    assert_eq!(sb.end_time(), 10.0);
}

#[test]
fn ids_are_never_reused_after_removal() {
    let mut tl = Timeline::new();
    let a = tl.add(SceneDraft::new("a")).unwrap();
    let b = tl.add(SceneDraft::new("b")).unwrap();
    assert!(tl.remove(b));
    let c = tl.add(SceneDraft::new("c")).unwrap();
    assert_ne!(c, b);
    assert!(c > b);
    assert!(tl.get(a).is_some());
}

#[test]
fn remove_is_idempotent() {
    let mut tl = Timeline::new();
    let a = tl.add(SceneDraft::new("a")).unwrap();
    assert!(tl.remove(a));
    let snapshot = tl.clone();
    assert!(!tl.remove(a));
    assert!(!tl.remove(SceneId(999)));
    assert_eq!(tl, snapshot);
}

#[test]
fn update_time_never_goes_below_minimum_duration() {
    let mut tl = Timeline::new();
    let id = human(&mut tl, 1.0, 3.0);
    let samples = [-10.0, -0.0, 0.0, 0.05, 0.7, 1.9, 2.9, 2.95, 3.0, 3.5, 100.0];
    for v in samples {
        tl.update_time(id, TimeEdge::Start, v).unwrap();
        let s = tl.get(id).unwrap();
        assert!(s.end_time() - s.start_time() >= MIN_SCENE_SECS, "start={v}");
        assert!(s.start_time() >= 0.0);
        tl.update_time(id, TimeEdge::End, v).unwrap();
        let s = tl.get(id).unwrap();
        assert!(s.end_time() - s.start_time() >= MIN_SCENE_SECS, "end={v}");
    }
}

#[test]
fn update_time_clamps_start_before_end() {
    let mut tl = Timeline::new();
    let id = human(&mut tl, 1.0, 3.0);
    tl.update_time(id, TimeEdge::Start, 5.0).unwrap();
    let s = tl.get(id).unwrap();
    assert!((s.start_time() - 2.9).abs() < 1e-9);
    assert_eq!(s.end_time(), 3.0);

    tl.update_time(id, TimeEdge::End, 0.0).unwrap();
    let s = tl.get(id).unwrap();
    assert!((s.end_time() - 3.0).abs() < 1e-9);
}

#[test]
fn update_time_rejects_unknown_id_and_non_finite_values() {
    let mut tl = Timeline::new();
    let id = human(&mut tl, 0.0, 2.0);
    assert!(tl.update_time(SceneId(42), TimeEdge::Start, 1.0).is_err());
    assert!(tl.update_time(id, TimeEdge::End, f64::NAN).is_err());
    assert!(tl.update_time(id, TimeEdge::End, f64::INFINITY).is_err());
}

#[test]
fn update_time_resorts_without_disturbing_others() {
    let mut tl = Timeline::new();
    let a = human(&mut tl, 0.0, 2.0);
    let b = human(&mut tl, 3.0, 5.0);
    let c = human(&mut tl, 6.0, 8.0);
    tl.set_prompt(b, "changed").unwrap();
    let order: Vec<_> = tl.scenes().iter().map(|s| s.id()).collect();
    assert_eq!(order, vec![a, b, c]);

    tl.update_time(c, TimeEdge::Start, 1.0).unwrap();
    let order: Vec<_> = tl.scenes().iter().map(|s| s.id()).collect();
    assert_eq!(order, vec![a, c, b]);
}

#[test]
fn ties_on_start_time_break_by_id() {
    let mut tl = Timeline::new();
    let a = human(&mut tl, 2.0, 4.0);
    let b = human(&mut tl, 2.0, 3.0);
    let c = human(&mut tl, 0.0, 1.0);
    let order: Vec<_> = tl.scenes().iter().map(|s| s.id()).collect();
    assert_eq!(order, vec![c, a, b]);
}

#[test]
fn merge_drops_candidates_overlapping_human_scene() {
    let mut tl = Timeline::new();
    let id = human(&mut tl, 0.0, 5.0);
    let before = tl.get(id).unwrap().clone();

    let report = tl
        .merge(vec![SceneDraft::candidate(span(2.0, 6.0), "detected")])
        .unwrap();
    assert_eq!(report.dropped, 1);
    assert!(report.accepted.is_empty());
    assert_eq!(tl.len(), 1);
    assert_eq!(tl.get(id).unwrap(), &before);
}

#[test]
fn merge_fills_gaps_and_touching_spans_are_not_overlap() {
    let mut tl = Timeline::new();
    human(&mut tl, 0.0, 5.0);
    let report = tl
        .merge(vec![
            SceneDraft::candidate(span(5.0, 7.0), "after"),
            SceneDraft::candidate(span(4.0, 9.0), "straddles"),
            SceneDraft::candidate(span(9.0, 12.0), "later"),
        ])
        .unwrap();
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(tl.len(), 3);
    assert!(tl.scenes()[1].auto_generated());
}

#[test]
fn merge_supersedes_overlapping_auto_scenes_and_keeps_identical_ones() {
    let mut tl = Timeline::new();
    tl.merge(vec![
        SceneDraft::candidate(span(0.0, 2.0), "one"),
        SceneDraft::candidate(span(2.0, 4.0), "two"),
        SceneDraft::candidate(span(10.0, 12.0), "far"),
    ])
    .unwrap();
    let one = tl.scenes()[0].id();
    let far = tl.scenes()[2].id();
    tl.set_code(one, "self.add(Circle())", Generator::RuleBased, Vec::new())
        .unwrap();

    let report = tl
        .merge(vec![
            SceneDraft::candidate(span(0.0, 2.0), "one"),
            SceneDraft::candidate(span(2.5, 5.0), "two, rephrased"),
        ])
        .unwrap();
    assert_eq!(report.unchanged, vec![one]);
    assert_eq!(report.replaced.len(), 1);
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(tl.get(one).unwrap().code(), "self.add(Circle())");
    assert!(tl.get(far).is_some());
    assert_eq!(tl.len(), 3);
}

#[test]
fn merge_with_no_candidates_changes_nothing() {
    let mut tl = Timeline::new();
    human(&mut tl, 0.0, 5.0);
    tl.merge(vec![SceneDraft::candidate(span(6.0, 8.0), "auto")])
        .unwrap();
    let snapshot = tl.clone();
    let report = tl.merge(Vec::new()).unwrap();
    assert_eq!(report, MergeReport::default());
    assert_eq!(tl, snapshot);
}

#[test]
fn merge_never_touches_human_scenes() {
    let mut tl = Timeline::new();
    let ids: Vec<_> = (0..5)
        .map(|i| human(&mut tl, f64::from(i) * 3.0, f64::from(i) * 3.0 + 2.0))
        .collect();
    let originals: Vec<_> = ids.iter().map(|id| tl.get(*id).unwrap().clone()).collect();

    let candidates = (0..30)
        .map(|i| {
            let a = f64::from(i) * 0.5;
            SceneDraft::candidate(span(a, a + 0.8), format!("c{i}"))
        })
        .collect();
    tl.merge(candidates).unwrap();

    for original in originals {
        assert_eq!(tl.get(original.id()).unwrap(), &original);
    }
    for s in tl.scenes().iter().filter(|s| s.auto_generated()) {
        for h in tl.scenes().iter().filter(|s| !s.auto_generated()) {
            assert!(!s.span().overlaps(h.span()));
        }
    }
}

#[test]
fn merge_rejects_untimed_candidates_without_mutating() {
    let mut tl = Timeline::new();
    human(&mut tl, 0.0, 1.0);
    let snapshot = tl.clone();
    assert!(tl.merge(vec![SceneDraft::new("no timing")]).is_err());
    assert_eq!(tl, snapshot);
}

#[test]
fn duration_prefers_audio_but_never_below_last_end() {
    let mut tl = Timeline::new();
    assert_eq!(tl.duration(), DURATION_FLOOR_SECS);
    human(&mut tl, 0.0, 12.0);
    assert_eq!(tl.duration(), 12.0);
    tl.commit(Edit::SetAudioDuration(Some(30.0))).unwrap();
    assert_eq!(tl.duration(), 30.0);
    tl.commit(Edit::SetAudioDuration(Some(10.0))).unwrap();
    assert_eq!(tl.duration(), 12.0);
    tl.commit(Edit::SetAudioDuration(Some(0.0))).unwrap();
    assert_eq!(tl.duration(), 12.0);
    assert!(tl.duration() >= tl.max_end_time().unwrap());
}

#[test]
fn apply_is_pure() {
    let mut tl = Timeline::new();
    let id = human(&mut tl, 0.0, 4.0);
    let (next, outcome) = tl
        .apply(Edit::UpdateTime {
            id,
            edge: TimeEdge::End,
            value: 9.0,
        })
        .unwrap();
    assert_eq!(outcome, EditOutcome::Updated(id));
    assert_eq!(tl.get(id).unwrap().end_time(), 4.0);
    assert_eq!(next.get(id).unwrap().end_time(), 9.0);
}

#[test]
fn manual_code_marks_scene_human_edited() {
    let mut tl = Timeline::new();
    tl.merge(vec![SceneDraft::candidate(span(0.0, 2.0), "auto")])
        .unwrap();
    let id = tl.scenes()[0].id();
    tl.set_code(id, "self.wait(1)", Generator::Llm, Vec::new())
        .unwrap();
    assert!(tl.get(id).unwrap().auto_generated());
    tl.set_code(id, "self.wait(2)", Generator::Manual, Vec::new())
        .unwrap();
    let s = tl.get(id).unwrap();
    assert!(!s.auto_generated());
    assert_eq!(s.generator(), Some(Generator::Manual));
}

#[test]
fn scenes_at_orders_by_layer() {
    let mut tl = Timeline::new();
    let bg = tl
        .add(SceneDraft::new("bg").span(span(0.0, 5.0)).layer(0))
        .unwrap();
    let fg = tl
        .add(SceneDraft::new("fg").span(span(2.0, 4.0)).layer(1))
        .unwrap();
    let at = |t| tl.scenes_at(t).iter().map(|s| s.id()).collect::<Vec<_>>();
    assert_eq!(at(1.0), vec![bg]);
    assert_eq!(at(3.0), vec![bg, fg]);
    assert_eq!(at(4.0), vec![bg]);
    assert!(at(5.0).is_empty());
}

#[test]
fn replace_keeps_ids_monotonic() {
    let mut tl = Timeline::new();
    human(&mut tl, 0.0, 1.0);
    human(&mut tl, 1.0, 2.0);
    let ids = tl
        .replace(vec![SceneDraft::new("x"), SceneDraft::new("y")])
        .unwrap();
    assert_eq!(ids, vec![SceneId(3), SceneId(4)]);
    assert_eq!(tl.get(SceneId(4)).unwrap().start_time(), 5.0);
}
