use ahash::AHashMap;

pub const SHINGLE_SIZE: usize = 3;

pub type Trigram = [char; SHINGLE_SIZE];

/// Trigram-count fingerprint of a piece of text, with its L2 norm cached.
#[derive(Debug, Clone)]
pub struct ShingleProfile {
    counts: AHashMap<Trigram, u32>,
    norm: f64,
}

impl ShingleProfile {
    /// Count every overlapping trigram. Text shorter than a trigram is padded
    /// with trailing spaces, so every profile has at least one entry.
    pub fn new(text: &str) -> Self {
        let mut chars: Vec<char> = text.chars().collect();
        while chars.len() < SHINGLE_SIZE {
            chars.push(' ');
        }

        let mut counts: AHashMap<Trigram, u32> = AHashMap::new();
        for window in chars.windows(SHINGLE_SIZE) {
            let trigram = [window[0], window[1], window[2]];
            *counts.entry(trigram).or_insert(0) += 1;
        }

        let norm = counts
            .values()
            .map(|&count| f64::from(count) * f64::from(count))
            .sum::<f64>()
            .sqrt();

        Self { counts, norm }
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// Number of distinct trigrams.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, trigram: &Trigram) -> u32 {
        self.counts.get(trigram).copied().unwrap_or(0)
    }

    /// Dot product of the two count vectors, probing the larger map with the smaller.
    pub fn dot(&self, other: &ShingleProfile) -> f64 {
        let (small, large) = if self.counts.len() < other.counts.len() {
            (&self.counts, &other.counts)
        } else {
            (&other.counts, &self.counts)
        };

        small
            .iter()
            .filter_map(|(trigram, &count)| {
                large
                    .get(trigram)
                    .map(|&other_count| f64::from(count) * f64::from(other_count))
            })
            .sum()
    }

    /// Cosine similarity in `[0, 1]`; 0 when nothing is shared.
    pub fn cosine(&self, other: &ShingleProfile) -> f32 {
        let denominator = self.norm * other.norm;
        if denominator <= 0.0 {
            return 0.0;
        }
        (self.dot(other) / denominator).clamp(0.0, 1.0) as f32
    }
}
