//! Job categories and their declared mutual-exclusion relationships.

/// A logical class of work for which at most one live owner may exist
/// machine-wide at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Vendor content crawling.
    Crawl,
    /// LLM classification over crawled content.
    Analysis,
    /// Dashboard/API serving.
    Serve,
}

impl Category {
    /// All known categories, in display order.
    pub const ALL: [Category; 3] = [Category::Crawl, Category::Analysis, Category::Serve];

    /// Lowercase identifier used in lock file names and records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Crawl => "crawl",
            Category::Analysis => "analysis",
            Category::Serve => "serve",
        }
    }

    /// Parse a category from its identifier.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "crawl" => Some(Category::Crawl),
            "analysis" => Some(Category::Analysis),
            "serve" => Some(Category::Serve),
            _ => None,
        }
    }

    /// Categories that must never run concurrently with this one.
    ///
    /// Crawl and Analysis contend for the same vendor budget and write the
    /// same content store, so they exclude each other. Serve only reads.
    pub fn conflicts_with(&self) -> &'static [Category] {
        match self {
            Category::Crawl => &[Category::Analysis],
            Category::Analysis => &[Category::Crawl],
            Category::Serve => &[],
        }
    }

    /// Deterministic lock file name for this category.
    pub fn lock_file_name(&self) -> String {
        format!("trawl_{}.lock", self.as_str())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verify that every declared conflict is symmetric.
///
/// An asymmetric table would make the outcome of concurrent acquisition
/// depend on which side ran first. Run at registry construction so a bad
/// table fails immediately rather than intermittently.
pub fn validate_mutex_table() -> crate::error::Result<()> {
    for category in Category::ALL {
        for partner in category.conflicts_with() {
            if !partner.conflicts_with().contains(&category) {
                return Err(crate::error::TrawlError::UserError(format!(
                    "mutual-exclusion table is asymmetric: {} excludes {} but not vice versa",
                    category, partner
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_str("unknown"), None);
    }

    #[test]
    fn lock_file_names_are_deterministic() {
        assert_eq!(Category::Crawl.lock_file_name(), "trawl_crawl.lock");
        assert_eq!(Category::Analysis.lock_file_name(), "trawl_analysis.lock");
    }

    #[test]
    fn mutex_table_is_symmetric() {
        validate_mutex_table().unwrap();
    }

    #[test]
    fn crawl_and_analysis_exclude_each_other() {
        assert!(Category::Crawl.conflicts_with().contains(&Category::Analysis));
        assert!(Category::Analysis.conflicts_with().contains(&Category::Crawl));
        assert!(Category::Serve.conflicts_with().is_empty());
    }
}
