//! TF-IDF vectorization of term definitions
//!
//! Tokenizes definitions with Unicode word segmentation, weights tokens by raw
//! count times smoothed inverse document frequency, and L2-normalizes each
//! row. The vocabulary is kept sorted so feature indices are stable for a
//! given corpus.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Built-in English stop list (a subset of the common scikit-learn list)
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
    "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
    "anyhow", "anyone", "anything", "anyway", "anywhere", "are", "around", "as", "at", "be",
    "became", "because", "become", "becomes", "been", "before", "being", "below", "beside",
    "besides", "between", "beyond", "both", "but", "by", "can", "cannot", "could", "did", "do",
    "does", "doing", "done", "down", "due", "during", "each", "either", "else", "enough",
    "etc", "even", "ever", "every", "few", "for", "from", "further", "had", "has", "have",
    "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "however", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "least", "less",
    "may", "me", "might", "more", "most", "mostly", "much", "must", "my", "myself", "neither",
    "never", "no", "nor", "not", "nothing", "now", "of", "off", "often", "on", "once", "one",
    "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out",
    "over", "own", "per", "perhaps", "rather", "same", "several", "she", "should", "since",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves",
    "then", "there", "thereby", "therefore", "these", "they", "this", "those", "though",
    "through", "thus", "to", "together", "too", "toward", "towards", "under", "until", "up",
    "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
    "where", "whereas", "whether", "which", "while", "who", "whoever", "whole", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

/// Sparse row: `(feature index, weight)` pairs sorted by feature index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from pairs; they are sorted and zero weights dropped
    pub fn from_pairs(mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|(_, w)| *w != 0.0);
        entries.sort_by_key(|(feature, _)| *feature);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Scale to unit length; the zero vector stays zero
    fn normalize(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, weight) in self.entries.iter_mut() {
                *weight /= norm;
            }
        }
        self
    }
}

/// Corpus summary logged alongside the semantic partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    pub documents: usize,
    pub vocabulary_size: usize,
    /// Documents with no token left after filtering
    pub empty_documents: usize,
    pub average_document_terms: f64,
}

/// TF-IDF vectorizer fitted on a corpus of definitions
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    /// Drop English stop words
    stop_words: bool,

    /// Minimum token length in characters
    min_token_len: usize,

    /// Token -> feature index, lexicographic
    vocabulary: BTreeMap<String, usize>,

    /// Smoothed IDF per feature index
    idf: Vec<f64>,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new(true, 2)
    }
}

impl TfIdfVectorizer {
    pub fn new(stop_words: bool, min_token_len: usize) -> Self {
        Self {
            stop_words,
            min_token_len: min_token_len.max(1),
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    /// Split text into lowercase tokens, applying length and stop-word filters
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(str::to_lowercase)
            .filter(|token| token.chars().count() >= self.min_token_len)
            .filter(|token| !(self.stop_words && is_stop_word(token)))
            .collect()
    }

    /// Learn vocabulary and IDF from the corpus, then transform it
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> (Vec<SparseVector>, CorpusStatistics) {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| self.tokenize(d.as_ref())).collect();

        let mut document_frequencies: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for token in unique {
                *document_frequencies.entry(token).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        self.vocabulary = document_frequencies
            .keys()
            .enumerate()
            .map(|(index, token)| (token.to_string(), index))
            .collect();
        self.idf = document_frequencies
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let vectors: Vec<SparseVector> = tokenized.iter().map(|tokens| self.weigh(tokens)).collect();

        let empty_documents = tokenized.iter().filter(|tokens| tokens.is_empty()).count();
        let average_document_terms = if tokenized.is_empty() {
            0.0
        } else {
            tokenized.iter().map(Vec::len).sum::<usize>() as f64 / n
        };
        let stats = CorpusStatistics {
            documents: documents.len(),
            vocabulary_size: self.vocabulary.len(),
            empty_documents,
            average_document_terms,
        };

        tracing::debug!(
            "TF-IDF fitted: {} documents, {} features, {} empty",
            stats.documents,
            stats.vocabulary_size,
            stats.empty_documents
        );

        (vectors, stats)
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokens {
            if let Some(&feature) = self.vocabulary.get(token) {
                *counts.entry(feature).or_insert(0.0) += 1.0;
            }
        }

        let entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(feature, tf)| (feature, tf * self.idf[feature]))
            .collect();

        SparseVector::from_pairs(entries).normalize()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn feature_index(&self, token: &str) -> Option<usize> {
        self.vocabulary.get(token).copied()
    }

    pub fn idf(&self, token: &str) -> Option<f64> {
        self.feature_index(token).map(|index| self.idf[index])
    }
}

fn is_stop_word(token: &str) -> bool {
    ENGLISH_STOP_WORDS.binary_search(&token).is_ok()
}
