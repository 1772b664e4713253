//! Pluggable string similarity used by the fuzzy skill matcher
//!
//! Every implementation must be symmetric (`sim(a, b) == sim(b, a)`) and
//! reflexive (`sim(a, a) == 1.0`), and return values in `[0, 1]`.

use crate::config::SimilarityBackend;
use std::collections::HashSet;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f32;

    fn name(&self) -> &'static str;
}

/// Orders the pair so asymmetric tie handling inside a metric can't leak out.
fn ordered<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn clamp_unit(value: f64) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0) as f32
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Similarity for JaroWinkler {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        if a == b {
            return 1.0;
        }
        let (x, y) = ordered(a, b);
        clamp_unit(strsim::jaro_winkler(x, y))
    }

    fn name(&self) -> &'static str {
        "jaro-winkler"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl Similarity for NormalizedLevenshtein {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        if a == b {
            return 1.0;
        }
        let (x, y) = ordered(a, b);
        clamp_unit(strsim::normalized_levenshtein(x, y))
    }

    fn name(&self) -> &'static str {
        "levenshtein"
    }
}

/// Jaccard overlap of lowercase word sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenJaccard;

impl TokenJaccard {
    fn tokens(text: &str) -> HashSet<String> {
        text.unicode_words().map(|w| w.to_lowercase()).collect()
    }
}

impl Similarity for TokenJaccard {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        if a == b {
            return 1.0;
        }
        let left = Self::tokens(a);
        let right = Self::tokens(b);
        let union = left.union(&right).count();
        if union == 0 {
            return 1.0;
        }
        let intersection = left.intersection(&right).count();
        intersection as f32 / union as f32
    }

    fn name(&self) -> &'static str {
        "token-jaccard"
    }
}

/// Anything that can turn text into a dense vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;

    fn name(&self) -> &'static str;
}

/// Hashes character n-grams into a fixed number of buckets (FNV-1a).
///
/// Deterministic and dependency free. Stands in for a real sentence-embedding
/// model behind the same [`Embedder`] seam.
#[derive(Debug, Clone)]
pub struct CharNgramEmbedder {
    dims: usize,
    n: usize,
}

impl Default for CharNgramEmbedder {
    fn default() -> Self {
        Self::new(256, 3)
    }
}

impl CharNgramEmbedder {
    pub fn new(dims: usize, n: usize) -> Self {
        Self {
            dims: dims.max(1),
            n: n.max(1),
        }
    }

    fn fnv1a(chars: &[char]) -> u64 {
        let mut hash: u64 = 0xcbf29ce484222325;
        for c in chars {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
        }
        hash
    }
}

impl Embedder for CharNgramEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        let padded: Vec<char> = format!(" {} ", text.to_lowercase()).chars().collect();

        if padded.len() < self.n {
            return vector;
        }
        for window in padded.windows(self.n) {
            let bucket = (Self::fnv1a(window) % self.dims as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn name(&self) -> &'static str {
        "char-ngram"
    }
}

/// Cosine similarity over vectors from an [`Embedder`], clamped to `[0, 1]`.
pub struct EmbeddingSimilarity<E: Embedder> {
    embedder: E,
}

impl<E: Embedder> EmbeddingSimilarity<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        clamp_unit((dot / (norm_a * norm_b)) as f64)
    }
}

impl<E: Embedder> Similarity for EmbeddingSimilarity<E> {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        if a == b {
            return 1.0;
        }
        let (x, y) = ordered(a, b);
        Self::cosine(&self.embedder.embed(x), &self.embedder.embed(y))
    }

    fn name(&self) -> &'static str {
        self.embedder.name()
    }
}

pub fn from_backend(backend: SimilarityBackend) -> Arc<dyn Similarity> {
    match backend {
        SimilarityBackend::JaroWinkler => Arc::new(JaroWinkler),
        SimilarityBackend::Levenshtein => Arc::new(NormalizedLevenshtein),
        SimilarityBackend::TokenJaccard => Arc::new(TokenJaccard),
        SimilarityBackend::CharNgram => Arc::new(EmbeddingSimilarity::new(CharNgramEmbedder::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "python",
        "pyhton",
        "Python 3",
        "javascript",
        "java",
        "machine learning",
        "learning machine",
        "c#",
        "kubernetes",
        "k8s",
        "data analysis",
    ];

    fn implementations() -> Vec<Box<dyn Similarity>> {
        vec![
            Box::new(JaroWinkler),
            Box::new(NormalizedLevenshtein),
            Box::new(TokenJaccard),
            Box::new(EmbeddingSimilarity::new(CharNgramEmbedder::default())),
        ]
    }

    #[test]
    fn test_reflexive_for_every_backend() {
        for sim in implementations() {
            for s in SAMPLES {
                assert_eq!(sim.similarity(s, s), 1.0, "{} not reflexive on {:?}", sim.name(), s);
            }
        }
    }

    #[test]
    fn test_symmetric_and_bounded_for_every_backend() {
        for sim in implementations() {
            for a in SAMPLES {
                for b in SAMPLES {
                    let ab = sim.similarity(a, b);
                    let ba = sim.similarity(b, a);
                    assert_eq!(ab, ba, "{} asymmetric on {:?} / {:?}", sim.name(), a, b);
                    assert!((0.0..=1.0).contains(&ab));
                }
            }
        }
    }

    #[test]
    fn test_typo_scores_high_under_jaro_winkler() {
        assert!(JaroWinkler.similarity("pyhton", "python") > 0.9);
        assert!(JaroWinkler.similarity("kubernetes", "excel") < 0.6);
    }

    #[test]
    fn test_token_jaccard_ignores_order() {
        assert_eq!(TokenJaccard.similarity("machine learning", "learning machine"), 1.0);
    }

    #[test]
    fn test_embedder_is_normalized() {
        let v = CharNgramEmbedder::default().embed("kubernetes");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}
