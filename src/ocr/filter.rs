//! Confidence filtering for recognized words.

use super::RecognizedWord;

/// Keep only words whose confidence is strictly above `threshold`.
///
/// Order is preserved. Applying the filter twice with the same threshold
/// returns the same list.
///
/// # Examples
///
/// ```
/// use folio_oxide::ocr::{filter_words, RecognizedWord};
///
/// let words = vec![
///     RecognizedWord::new("kept", 0, 0, 10, 10, 61),
///     RecognizedWord::new("dropped", 0, 0, 10, 10, 60),
/// ];
/// let kept = filter_words(words, 60);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].text, "kept");
/// ```
pub fn filter_words(words: Vec<RecognizedWord>, threshold: u8) -> Vec<RecognizedWord> {
    let total = words.len();
    let kept: Vec<RecognizedWord> = words
        .into_iter()
        .filter(|word| word.confidence > threshold)
        .collect();

    if kept.len() < total {
        log::debug!(
            "Dropped {} of {} words at or below confidence {}",
            total - kept.len(),
            total,
            threshold
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, confidence: u8) -> RecognizedWord {
        RecognizedWord::new(text, 0, 0, 10, 10, confidence)
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let kept = filter_words(vec![word("at", 60), word("above", 61)], 60);
        assert_eq!(kept, vec![word("above", 61)]);
    }

    #[test]
    fn test_preserves_order() {
        let words = vec![word("a", 90), word("b", 10), word("c", 95), word("d", 70)];
        let texts: Vec<String> = filter_words(words, 60).into_iter().map(|w| w.text).collect();
        assert_eq!(texts, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_words(Vec::new(), 60).is_empty());
    }

    #[test]
    fn test_zero_threshold_drops_only_zero() {
        let kept = filter_words(vec![word("none", 0), word("some", 1)], 0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "some");
    }

    #[test]
    fn test_threshold_100_drops_everything() {
        assert!(filter_words(vec![word("perfect", 100)], 100).is_empty());
    }
}
