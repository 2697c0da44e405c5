use super::*;

#[test]
fn plain_arrays_default_confidence() {
    let words = parse_transcript(r#"[{"word":" Hello","start":0.0,"end":0.4},{"word":"world.","start":0.5,"end":0.9,"confidence":0.8}]"#)
        .unwrap();
    assert_eq!(words[0], WordStamp::new("Hello", 0.0, 0.4));
    assert_eq!(words[1].confidence, 0.8);
}

#[test]
fn whisper_segments_are_flattened() {
    let json = r#"{
        "text": "one two three",
        "language": "en",
        "segments": [
            {"id": 0, "start": 0.0, "end": 1.0, "words": [
                {"word": " one", "start": 0.0, "end": 0.3, "probability": 0.9},
                {"word": " two", "start": 0.4, "end": 0.7, "probability": 0.95}
            ]},
            {"id": 1, "start": 1.0, "end": 2.0, "words": [
                {"word": " three", "start": 1.2, "end": 1.6}
            ]}
        ]
    }"#;
    let words = parse_transcript(json).unwrap();
    let text: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(text, ["one", "two", "three"]);
    assert_eq!(words[0].confidence, 0.9);
    assert_eq!(words[2].confidence, 1.0);
}

#[test]
fn top_level_words_win_over_segments() {
    let json = r#"{"words":[{"word":"a","start":0,"end":1}],"segments":[{"words":[{"word":"b","start":0,"end":1}]}]}"#;
    let words = parse_transcript(json).unwrap();
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].word, "a");
}

#[test]
fn bad_timing_is_repaired_or_dropped() {
    let json = r#"[
        {"word":"neg","start":-1.0,"end":0.5},
        {"word":"inverted","start":2.0,"end":1.0,"confidence":3.0},
        {"word":"ok","start":3.0,"end":3.5}
    ]"#;
    let words = parse_transcript(json).unwrap();
    assert_eq!(words.len(), 2);
    assert_eq!(words[0].end, 2.0);
    assert_eq!(words[0].confidence, 1.0);
}

#[test]
fn malformed_documents_are_reported() {
    for json in ["{not json", "42", r#"[{"word":"x"}]"#] {
        assert!(matches!(
            parse_transcript(json),
            Err(ManimlineError::MalformedInput(_))
        ));
    }
    assert_eq!(parse_transcript("[]").unwrap(), Vec::new());
    assert_eq!(parse_transcript("{}").unwrap(), Vec::new());
}

#[test]
fn files_are_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.json");
    std::fs::write(&path, r#"[{"word":"hi","start":0,"end":0.2}]"#).unwrap();
    assert_eq!(read_transcript(&path).unwrap().len(), 1);
    assert!(read_transcript(dir.path().join("missing.json")).is_err());
}
