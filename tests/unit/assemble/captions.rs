use super::*;

fn words() -> Vec<WordStamp> {
    vec![
        WordStamp::new("Hello", 0.0, 0.5),
        WordStamp::new("world.", 0.6, 1.0),
        WordStamp::new("Next", 1.2, 1.5),
    ]
}

fn texts(cues: &[CaptionCue]) -> Vec<&str> {
    cues.iter().map(|c| c.text.as_str()).collect()
}

#[test]
fn word_by_word_grows_within_a_sentence() {
    let cues = caption_cues(&words(), CaptionStyle::WordByWord);
    assert_eq!(texts(&cues), ["Hello", "Hello world.", "Next"]);
    let spans: Vec<_> = cues.iter().map(|c| (c.start, c.end)).collect();
    assert_eq!(spans, [(0.0, 0.6), (0.6, 1.0), (1.2, 1.5)]);
    assert!(cues.iter().all(|c| c.highlight.is_none()));
}

#[test]
fn sentence_style_spans_the_whole_sentence() {
    let cues = caption_cues(&words(), CaptionStyle::Sentence);
    assert_eq!(texts(&cues), ["Hello world.", "Next"]);
    assert_eq!((cues[0].start, cues[0].end), (0.0, 1.0));
    assert_eq!((cues[1].start, cues[1].end), (1.2, 1.5));
}

#[test]
fn hybrid_repeats_the_spoken_word() {
    let cues = caption_cues(&words(), CaptionStyle::Hybrid);
    assert_eq!(texts(&cues), ["Hello world.", "Hello world.", "Next"]);
    let highlights: Vec<_> = cues.iter().map(|c| c.highlight.as_deref()).collect();
    assert_eq!(highlights, [Some("Hello"), Some("world."), Some("Next")]);
}

#[test]
fn blank_and_badly_timed_words_are_skipped() {
    let words = vec![
        WordStamp::new("  ", 0.0, 0.2),
        WordStamp::new("lost", f64::NAN, 1.0),
        WordStamp::new("early", -1.0, 0.5),
        WordStamp::new(" kept ", 0.3, 0.4),
    ];
    let cues = caption_cues(&words, CaptionStyle::WordByWord);
    assert_eq!(texts(&cues), ["kept"]);
}

#[test]
fn every_cue_lasts_a_minimum_time() {
    let words = vec![WordStamp::new("blink", 2.0, 2.0), WordStamp::new("back", 3.0, 2.5)];
    let cues = caption_cues(&words, CaptionStyle::WordByWord);
    assert!(cues.iter().all(|c| c.end - c.start >= MIN_CAPTION_SECS - 1e-12));
    assert!(caption_cues(&[], CaptionStyle::Sentence).is_empty());
}

#[test]
fn clip_drops_and_trims_cues_past_the_end() {
    let cues = clip(caption_cues(&words(), CaptionStyle::WordByWord), 1.3);
    assert_eq!(texts(&cues), ["Hello", "Hello world.", "Next"]);
    assert_eq!(cues[2].end, 1.3);
    let cues = clip(caption_cues(&words(), CaptionStyle::WordByWord), 1.2);
    assert_eq!(cues.len(), 2);
}

#[test]
fn default_config_validates_and_bad_colors_do_not() {
    assert!(CaptionConfig::default().validate().is_ok());
    let bad = CaptionConfig {
        highlight_color: "not a color".into(),
        ..CaptionConfig::default()
    };
    assert!(bad.validate().is_err());
    let zero = CaptionConfig {
        font_size: 0,
        ..CaptionConfig::default()
    };
    assert!(zero.validate().is_err());
}

#[test]
fn config_reads_snake_case_json() {
    let c: CaptionConfig =
        serde_json::from_str(r#"{"enabled": true, "style": "hybrid", "position": "top"}"#).unwrap();
    assert!(c.enabled);
    assert_eq!(c.style, CaptionStyle::Hybrid);
    assert_eq!(c.position, CaptionPosition::Top);
    assert_eq!(c.font, "Arial");
}

#[test]
fn helpers_place_and_layer_the_caption() {
    let top = CaptionConfig {
        position: CaptionPosition::Top,
        background: None,
        ..CaptionConfig::default()
    };
    let h = helpers(&top, 4);
    assert!(h.contains("caption.to_edge(UP, buff=0.5)"));
    assert!(h.contains("caption.set_z_index(4)"));
    assert!(h.contains("font=\"Arial\", font_size=48, color=WHITE"));
    assert!(h.contains("font_size=36, color=YELLOW"));
    assert!(!h.contains("BackgroundRectangle"));

    let h = helpers(&CaptionConfig::default(), 0);
    assert!(h.contains("BackgroundRectangle(caption, color=BLACK, fill_opacity=0.7"));
}

#[test]
fn show_calls_quote_caption_text() {
    let plain = CaptionCue {
        start: 0.0,
        end: 1.0,
        text: r#"She said "hi""#.into(),
        highlight: None,
    };
    assert_eq!(show_call(&plain), r#"self._show_caption("She said \"hi\"")"#);
    let hybrid = CaptionCue {
        highlight: Some("hi".into()),
        ..plain
    };
    assert_eq!(show_call(&hybrid), r#"self._show_caption("She said \"hi\"", "hi")"#);
}
