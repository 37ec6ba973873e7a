use miette::{Context, IntoDiagnostic, Result};
use regex::{Regex, RegexBuilder};

/// Title fragments of videos that are not a single sketch.
///
/// Each entry is a regular expression matched case-insensitively anywhere in the title.
pub const DEFAULT_EXCLUDED_PATTERNS: &[&str] = &[
    // Groups of sketches
    r"compilation",
    r"best\sof",
    r"collection",
    r"marathon",
    r"sketches",
    r"playlist",
    r"supercut",
    // Long form uploads
    r"full\sepisode",
    r"season\s\d+",
    r"hour",
    r"hours",
    r"minutes",
    // Everything around the show
    r"promo",
    r"trailer",
    r"interview",
    r"behind\sthe\sscenes",
];

/// Decide whether a video title should be left out of the catalog
pub trait TitleFilter {
    /// Return true if the video with this title must be excluded
    fn excludes(&self, title: &str) -> bool;
}

impl<F> TitleFilter for F
where
    F: Fn(&str) -> bool,
{
    fn excludes(&self, title: &str) -> bool {
        self(title)
    }
}

/// Exclude every title matching at least one of a list of patterns
#[derive(Debug, Clone)]
pub struct PatternFilter {
    re: Option<Regex>,
}

impl PatternFilter {
    /// Compile the patterns into a single case-insensitive alternation.
    ///
    /// An empty list produces a filter that excludes nothing.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        // Validate the patterns one by one to point at the faulty one
        for pattern in patterns {
            let pattern = pattern.as_ref();
            Regex::new(pattern)
                .into_diagnostic()
                .wrap_err_with(|| format!("Invalid title pattern '{pattern}'"))?;
        }

        if patterns.is_empty() {
            return Ok(Self { re: None });
        }

        let alternation = patterns
            .iter()
            .map(|p| format!("(?:{})", p.as_ref()))
            .collect::<Vec<_>>()
            .join("|");

        let re = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .into_diagnostic()
            .wrap_err("Could not compile the title patterns")?;

        Ok(Self { re: Some(re) })
    }

    /// The filter built from [`DEFAULT_EXCLUDED_PATTERNS`]
    pub fn default_patterns() -> Result<Self> {
        Self::new(DEFAULT_EXCLUDED_PATTERNS)
    }
}

impl TitleFilter for PatternFilter {
    fn excludes(&self, title: &str) -> bool {
        self.re.as_ref().is_some_and(|re| re.is_match(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patterns_exclude_non_sketches() {
        let filter = PatternFilter::default_patterns().unwrap();

        for title in [
            "Key & Peele Compilation",
            "The BEST OF Season 2",
            "Season 5 Sneak Peek",
            "1 Hour of Sketches",
            "Key & Peele - Official Trailer",
            "Interview with the Cast",
            "Behind the Scenes: Substitute Teacher",
            "Full Episode 3",
            "Ten Minutes of Laughs",
            "Sports Supercut",
            "Season 3 Promo",
        ] {
            assert!(filter.excludes(title), "'{title}' should be excluded");
        }
    }

    #[test]
    fn default_patterns_keep_sketches() {
        let filter = PatternFilter::default_patterns().unwrap();

        for title in ["Substitute Teacher", "East/West Bowl", "Obama's Anger Translator"] {
            assert!(!filter.excludes(title), "'{title}' should be kept");
        }
    }

    #[test]
    fn patterns_match_inside_words() {
        let filter = PatternFilter::default_patterns().unwrap();

        // "hour" is a plain substring pattern
        assert!(filter.excludes("Happy Hourglass"));
    }

    #[test]
    fn season_requires_a_number() {
        let filter = PatternFilter::default_patterns().unwrap();

        assert!(!filter.excludes("Open Season"));
        assert!(filter.excludes("season 12 opener"));
    }

    #[test]
    fn custom_patterns_replace_defaults() {
        let filter = PatternFilter::new(&["^Bonus"]).unwrap();

        assert!(filter.excludes("bonus clip"));
        assert!(!filter.excludes("Key & Peele Compilation"));
    }

    #[test]
    fn empty_pattern_list_excludes_nothing() {
        let filter = PatternFilter::new::<&str>(&[]).unwrap();

        assert!(!filter.excludes(""));
        assert!(!filter.excludes("compilation"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = PatternFilter::new(&["ok", "(unclosed"]).unwrap_err();

        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn closures_are_title_filters() {
        let filter = |title: &str| title.len() > 5;

        assert!(filter.excludes("long title"));
        assert!(!filter.excludes("tiny"));
    }
}
