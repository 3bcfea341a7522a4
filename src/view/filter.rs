//! What the user currently wants to see.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The category slot of the filter bar. `Recent` and `Favorites` occupy
/// the slot exclusively, so they never combine with a named category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategorySelector {
    #[default]
    All,
    Recent,
    Favorites,
    Category(String),
}

impl CategorySelector {
    pub fn as_str(&self) -> &str {
        match self {
            CategorySelector::All => "all",
            CategorySelector::Recent => "recent",
            CategorySelector::Favorites => "favorites",
            CategorySelector::Category(name) => name,
        }
    }
}

impl From<&str> for CategorySelector {
    fn from(s: &str) -> Self {
        match s {
            "" | "all" => CategorySelector::All,
            "recent" => CategorySelector::Recent,
            "favorites" => CategorySelector::Favorites,
            name => CategorySelector::Category(name.to_string()),
        }
    }
}

impl fmt::Display for CategorySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "uploadDate-desc")]
    UploadDateDesc,
    #[serde(rename = "uploadDate-asc")]
    UploadDateAsc,
    #[serde(rename = "title-asc")]
    TitleAsc,
    #[serde(rename = "title-desc")]
    TitleDesc,
    #[serde(rename = "size-desc")]
    SizeDesc,
    #[serde(rename = "size-asc")]
    SizeAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::UploadDateDesc,
        SortKey::UploadDateAsc,
        SortKey::TitleAsc,
        SortKey::TitleDesc,
        SortKey::SizeDesc,
        SortKey::SizeAsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::UploadDateDesc => "uploadDate-desc",
            SortKey::UploadDateAsc => "uploadDate-asc",
            SortKey::TitleAsc => "title-asc",
            SortKey::TitleDesc => "title-desc",
            SortKey::SizeDesc => "size-desc",
            SortKey::SizeAsc => "size-asc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SortKey::UploadDateDesc => "Newest first",
            SortKey::UploadDateAsc => "Oldest first",
            SortKey::TitleAsc => "Title A-Z",
            SortKey::TitleDesc => "Title Z-A",
            SortKey::SizeDesc => "Largest first",
            SortKey::SizeAsc => "Smallest first",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown sort key '{}'", s))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of the current view. Changing any control builds
/// a new spec.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub selector: CategorySelector,
    pub search_term: String,
    pub active_tags: BTreeSet<String>,
    pub sort_key: SortKey,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selector(mut self, selector: impl Into<CategorySelector>) -> Self {
        self.selector = selector.into();
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.active_tags.insert(tag.into());
        self
    }

    /// Activate `tag` if inactive, deactivate it otherwise.
    pub fn with_tag_toggled(mut self, tag: &str) -> Self {
        if !self.active_tags.remove(tag) {
            self.active_tags.insert(tag.to_string());
        }
        self
    }

    pub fn with_sort(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    /// Back to all photos with no search or tags; the sort order is kept.
    pub fn cleared(self) -> Self {
        Self {
            sort_key: self.sort_key,
            ..Self::default()
        }
    }

    pub fn is_tag_active(&self, tag: &str) -> bool {
        self.active_tags.contains(tag)
    }
}

impl From<String> for CategorySelector {
    fn from(s: String) -> Self {
        CategorySelector::from(s.as_str())
    }
}
