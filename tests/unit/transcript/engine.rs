use super::*;
use crate::cache::content::ManualClock;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Counting {
    calls: AtomicUsize,
}

impl TranscriptionEngine for Counting {
    fn model(&self) -> &str {
        "tiny"
    }

    fn transcribe(&self, audio: &[u8], _language: &str) -> ManimlineResult<Vec<WordStamp>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![WordStamp::new(format!("len{}", audio.len()), 0.0, 0.5)])
    }
}

fn calls(t: &CachedTranscriber<Counting>) -> usize {
    t.engine().calls.load(Ordering::SeqCst)
}

#[test]
fn same_audio_and_params_hit_the_cache() {
    let t = CachedTranscriber::new(Counting::default(), ContentCache::in_memory());
    let a = t.transcribe(b"abc", "en").unwrap();
    let b = t.transcribe(b"abc", "en").unwrap();
    assert_eq!(a, b);
    assert_eq!(calls(&t), 1);

    t.transcribe(b"abc", "fr").unwrap();
    t.transcribe(b"abd", "en").unwrap();
    assert_eq!(calls(&t), 3);
}

#[test]
fn unreadable_cached_value_is_replaced() {
    let cache = ContentCache::in_memory();
    let key = transcription_key(b"abc", "tiny", "en");
    cache.put(&key, serde_json::json!("garbage"), 10_000).unwrap();

    let t = CachedTranscriber::new(Counting::default(), cache.clone());
    let words = t.transcribe(b"abc", "en").unwrap();
    assert_eq!(words[0].word, "len3");
    assert_eq!(calls(&t), 1);
    assert!(cache.get(&key).is_some_and(|v| v.is_array()));
}

#[test]
fn entries_expire_with_the_transcription_ttl() {
    let clock = Arc::new(ManualClock::new(0));
    let cache = ContentCache::in_memory().with_clock(clock.clone());
    let t = CachedTranscriber::new(Counting::default(), cache.clone());
    t.transcribe(b"abc", "en").unwrap();
    clock.advance(cache.ttls().transcription_ms);
    t.transcribe(b"abc", "en").unwrap();
    assert_eq!(calls(&t), 1);
    clock.advance(1);
    t.transcribe(b"abc", "en").unwrap();
    assert_eq!(calls(&t), 2);
}

#[test]
fn paths_are_read_as_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let audio = dir.path().join("a.wav");
    std::fs::write(&audio, b"RIFF....").unwrap();
    let t = CachedTranscriber::new(Counting::default(), ContentCache::in_memory());
    assert_eq!(t.transcribe_path(&audio, "en").unwrap()[0].word, "len8");
    assert!(t.transcribe_path(dir.path().join("missing.wav"), "en").is_err());
}
