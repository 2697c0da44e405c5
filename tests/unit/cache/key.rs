use super::*;

#[test]
fn keys_are_lowercase_sha256_hex() {
    let k = CacheKey::builder("ns").field("a", "b").finish();
    assert_eq!(k.as_str().len(), 64);
    assert!(is_hex_digest(k.as_str()));
    assert_eq!(CacheKey::from_hex(k.as_str()), Some(k.clone()));
    assert_eq!(CacheKey::from_hex("../etc/passwd"), None);
    assert_eq!(CacheKey::from_hex(&k.as_str().to_uppercase()), None);
}

#[test]
fn field_boundaries_and_namespaces_matter() {
    let a = CacheKey::builder("ns").field("ab", "c").finish();
    let b = CacheKey::builder("ns").field("a", "bc").finish();
    let c = CacheKey::builder("other").field("ab", "c").finish();
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, CacheKey::builder("ns").field("ab", "c").finish());
}

#[test]
fn code_gen_key_normalizes_whitespace_but_not_case() {
    let style = StyleParams::default();
    let k = code_gen_key("a red  square\tspinning", VisualType::Custom, &style);
    assert_eq!(
        k,
        code_gen_key("  a red square spinning \n", VisualType::Custom, &style)
    );
    assert_ne!(
        k,
        code_gen_key("A red square spinning", VisualType::Custom, &style)
    );
}

#[test]
fn code_gen_key_covers_visual_type_and_style() {
    let style = StyleParams::default();
    let base = code_gen_key("waves", VisualType::Auto, &style);
    assert_ne!(base, code_gen_key("waves", VisualType::Graph, &style));

    let colored = StyleParams {
        color: Some("RED".to_owned()),
        ..StyleParams::default()
    };
    assert_ne!(base, code_gen_key("waves", VisualType::Auto, &colored));

    let slower = StyleParams {
        run_time: style.run_time * 2.0,
        ..StyleParams::default()
    };
    assert_ne!(base, code_gen_key("waves", VisualType::Auto, &slower));
}

#[test]
fn transcription_key_tracks_audio_model_and_language() {
    let k = transcription_key(b"RIFF....", "base", "en");
    assert_eq!(k, transcription_key(b"RIFF....", "base", "en"));
    assert_ne!(k, transcription_key(b"RIFF...!", "base", "en"));
    assert_ne!(k, transcription_key(b"RIFF....", "small", "en"));
    assert_ne!(k, transcription_key(b"RIFF....", "base", "de"));
}

#[test]
fn sha256_hex_matches_known_vector() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn data_digest_extends_the_code_gen_key() {
    let style = StyleParams::default();
    let plain = code_gen_key("sales", VisualType::TimeSeries, &style);
    assert_eq!(plain, code_gen_key_with_data("sales", VisualType::TimeSeries, &style, None));
    let a = code_gen_key_with_data("sales", VisualType::TimeSeries, &style, Some(&"a".repeat(64)));
    let b = code_gen_key_with_data("sales", VisualType::TimeSeries, &style, Some(&"b".repeat(64)));
    assert_ne!(plain, a);
    assert_ne!(a, b);
}
