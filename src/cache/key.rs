use crate::codegen::style::StyleParams;
use crate::foundation::core::collapse_whitespace;
use crate::scene::model::VisualType;
use sha2::Digest as _;
use std::fmt;

/// Namespace of code synthesis entries.
pub const CODE_GEN_NAMESPACE: &str = "code_gen";
/// Namespace of transcription entries.
pub const TRANSCRIPTION_NAMESPACE: &str = "transcription";

/// Content hash identifying one cache entry: lowercase hex SHA-256.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Start a key in `namespace`.
    pub fn builder(namespace: &str) -> CacheKeyBuilder {
        let mut b = CacheKeyBuilder {
            hasher: sha2::Sha256::new(),
        };
        b.write_str(namespace);
        b
    }

    /// Accept an already computed hex digest.
    pub fn from_hex(hex: &str) -> Option<Self> {
        is_hex_digest(hex).then(|| Self(hex.to_owned()))
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulates ordered `(field, value)` pairs into a [`CacheKey`].
///
/// Every item is length-prefixed, so `("ab", "c")` and `("a", "bc")` hash differently.
#[derive(Clone)]
pub struct CacheKeyBuilder {
    hasher: sha2::Sha256,
}

impl CacheKeyBuilder {
    /// Add a text field.
    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.write_str(name);
        self.hasher.update([0u8]);
        self.write_str(value);
        self
    }

    /// Add a binary field.
    pub fn bytes_field(mut self, name: &str, value: &[u8]) -> Self {
        self.write_str(name);
        self.hasher.update([1u8]);
        self.hasher.update((value.len() as u64).to_le_bytes());
        self.hasher.update(value);
        self
    }

    /// Finish hashing.
    pub fn finish(self) -> CacheKey {
        CacheKey(to_hex(&self.hasher.finalize()))
    }

    fn write_str(&mut self, s: &str) {
        self.hasher.update((s.len() as u64).to_le_bytes());
        self.hasher.update(s.as_bytes());
    }
}

/// Key of a code synthesis request.
///
/// The prompt is trimmed and internal whitespace collapsed; case is preserved.
pub fn code_gen_key(prompt: &str, visual_type: VisualType, style: &StyleParams) -> CacheKey {
    code_gen_key_with_data(prompt, visual_type, style, None)
}

/// [`code_gen_key`] for a request that also carries a data table, identified by its digest.
///
/// Without a digest the key equals [`code_gen_key`].
pub fn code_gen_key_with_data(
    prompt: &str,
    visual_type: VisualType,
    style: &StyleParams,
    data_digest: Option<&str>,
) -> CacheKey {
    let mut b = CacheKey::builder(CODE_GEN_NAMESPACE)
        .field("prompt", &collapse_whitespace(prompt))
        .field("visual_type", visual_type.as_str());
    for (name, value) in style.cache_fields() {
        b = b.field(name, &value);
    }
    if let Some(digest) = data_digest {
        b = b.field("data_sha256", digest);
    }
    b.finish()
}

/// Key of a transcription request over raw audio bytes.
pub fn transcription_key(audio: &[u8], model: &str, language: &str) -> CacheKey {
    CacheKey::builder(TRANSCRIPTION_NAMESPACE)
        .field("audio_sha256", &sha256_hex(audio))
        .field("model", model.trim())
        .field("language", language.trim())
        .finish()
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    to_hex(&sha2::Sha256::digest(bytes))
}

pub(crate) fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn to_hex(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/cache/key.rs"]
mod tests;
