use serde::Deserialize;
use tracing::info;

/// Highest rating a card can show; the star row always has this many glyphs.
pub const MAX_RATING: u8 = 5;

/// One review as supplied by the caller or the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewRecord {
    pub company: String,
    pub rating: u8,
    pub text: String,
}

impl ReviewRecord {
    pub fn new(company: impl Into<String>, rating: u8, text: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            rating,
            text: text.into(),
        }
    }

    /// Number of filled stars, never more than [`MAX_RATING`].
    pub fn filled_stars(&self) -> u8 {
        self.rating.min(MAX_RATING)
    }
}

/// Returns `reviews` unchanged unless it is empty, in which case the built-in
/// set is used so the carousel is never blank.
pub fn with_fallback(reviews: &[ReviewRecord]) -> Vec<ReviewRecord> {
    if reviews.is_empty() {
        info!(count = DEFAULT_REVIEWS.len(), "no reviews supplied; using defaults");
        return default_reviews();
    }
    reviews.to_vec()
}

pub fn default_reviews() -> Vec<ReviewRecord> {
    DEFAULT_REVIEWS
        .iter()
        .map(|(company, rating, text)| ReviewRecord::new(*company, *rating, *text))
        .collect()
}

const DEFAULT_REVIEWS: [(&str, u8, &str); 6] = [
    (
        "Artisan Collective",
        5,
        "Elena's ceramic sculptures transformed our gallery space completely. Her unique artistic vision and exceptional craftsmanship create pieces that captivate every visitor. Truly extraordinary work that exceeds all expectations.",
    ),
    (
        "Modern Living Co.",
        5,
        "Working with Elena was an absolute pleasure. She created custom ceramic pieces that perfectly complement our interior design aesthetic. Her attention to detail and creative approach are simply unmatched.",
    ),
    (
        "Heritage Museum",
        4,
        "Elena's sculptural ceramics brought a fresh contemporary perspective to our traditional collection. Her innovative techniques and artistic vision create dialogue between past and present beautifully.",
    ),
    (
        "Boutique Hotels Group",
        5,
        "The ceramic installations Elena created for our properties are conversation starters. Guests are consistently amazed by the intricate details and unique forms. Professional service, artistic excellence.",
    ),
    (
        "Creative Interiors",
        4,
        "Elena's functional pottery pieces are works of art that our clients treasure. Each piece reflects her masterful understanding of form, texture, and glazing techniques. Highly recommended for discerning collectors.",
    ),
    (
        "Sculpture Society",
        5,
        "Elena's innovative approach to clay as a medium pushes artistic boundaries. Her sculptures demonstrate technical mastery while maintaining emotional depth. A truly gifted artist whose work speaks volumes.",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_falls_back_to_defaults() {
        let reviews = with_fallback(&[]);
        assert_eq!(reviews.len(), 6);
        assert_eq!(reviews[0].company, "Artisan Collective");
    }

    #[test]
    fn supplied_list_is_kept() {
        let supplied = vec![ReviewRecord::new("Acme", 3, "Fine.")];
        assert_eq!(with_fallback(&supplied), supplied);
    }

    #[test]
    fn stars_are_capped() {
        assert_eq!(ReviewRecord::new("x", 9, "y").filled_stars(), MAX_RATING);
        assert_eq!(ReviewRecord::new("x", 0, "y").filled_stars(), 0);
    }
}
