use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use sentence_utils::Token;

/// Word-bank shuffling, injected so tests can pin the order.
pub trait Shuffler {
    fn shuffle(&mut self, tokens: &mut [Token]);
}

/// The production shuffler. Seeded from the clock rather than OS entropy so
/// the same code path works on wasm without a getrandom backend.
pub struct SeededShuffler {
    rng: ChaCha8Rng,
}

impl SeededShuffler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_clock() -> Self {
        let now = chrono::Utc::now();
        let seed = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_millis());
        Self::new(seed as u64)
    }
}

impl Shuffler for SeededShuffler {
    fn shuffle(&mut self, tokens: &mut [Token]) {
        tokens.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
pub(crate) struct FixedOrder(pub Vec<usize>);

#[cfg(test)]
impl Shuffler for FixedOrder {
    /// Reorders tokens so that position i holds the token whose tag is
    /// `self.0[i]`. Panics (test-only) if a tag is missing.
    fn shuffle(&mut self, tokens: &mut [Token]) {
        let mut pool: Vec<Token> = tokens.to_vec();
        for (slot, tag) in self.0.iter().enumerate() {
            let found = pool
                .iter()
                .position(|t| t.tag == *tag)
                .expect("fixed order references a known tag");
            tokens[slot] = pool.remove(found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<Token> {
        words
            .iter()
            .enumerate()
            .map(|(tag, text)| Token {
                tag,
                text: (*text).to_string(),
            })
            .collect()
    }

    #[test]
    fn shuffle_permutes_without_losing_tokens() {
        let original = tokens(&["I", "wake", "up", "at", "7", "a.m."]);
        let mut shuffled = original.clone();
        SeededShuffler::new(7).shuffle(&mut shuffled);

        let mut sorted = shuffled.clone();
        sorted.sort_by_key(|t| t.tag);
        assert_eq!(sorted, original);
    }

    #[test]
    fn same_seed_same_order() {
        let mut a = tokens(&["I", "wake", "up", "at", "7", "a.m."]);
        let mut b = a.clone();
        SeededShuffler::new(42).shuffle(&mut a);
        SeededShuffler::new(42).shuffle(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_order_places_tags_where_asked() {
        let mut bank = tokens(&["a", "b", "c"]);
        FixedOrder(vec![2, 0, 1]).shuffle(&mut bank);
        let texts: Vec<&str> = bank.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
    }
}
