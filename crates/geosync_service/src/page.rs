//! Paged transfer types.
//!
//! Replica downloads and change pulls move features in fixed-size
//! pages so a cancel can land between pages instead of after a full
//! layer transfer.

use geosync_model::Feature;

/// One page of a full-extent feature extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePage {
    /// Features in this page.
    pub features: Vec<Feature>,
    /// Cursor to pass back for the next page.
    pub cursor: u64,
    /// True if the service holds more features past this page.
    pub has_more: bool,
    /// Server change version at extraction time. Synchronization
    /// starts pulling changes from this point.
    pub version: u64,
}

impl FeaturePage {
    /// Creates a page.
    pub fn new(features: Vec<Feature>, cursor: u64, has_more: bool, version: u64) -> Self {
        Self {
            features,
            cursor,
            has_more,
            version,
        }
    }

    /// Creates a terminal empty page at the given version.
    pub fn empty(version: u64) -> Self {
        Self {
            features: Vec::new(),
            cursor: 0,
            has_more: false,
            version,
        }
    }
}

/// One page of changes since a known server version.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePage {
    /// Features changed since the requested version, oldest first.
    pub features: Vec<Feature>,
    /// Server version after consuming this page. Passing it back
    /// resumes where this page ended.
    pub version: u64,
    /// True if more changes follow this page.
    pub has_more: bool,
}

impl ChangePage {
    /// Creates a page.
    pub fn new(features: Vec<Feature>, version: u64, has_more: bool) -> Self {
        Self {
            features,
            version,
            has_more,
        }
    }

    /// Creates a terminal empty page at the given version.
    pub fn empty(version: u64) -> Self {
        Self {
            features: Vec::new(),
            version,
            has_more: false,
        }
    }
}
