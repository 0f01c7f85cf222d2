//! Content filters.
//!
//! Filters are consulted while the content file is read. The first enabled,
//! valid filter that matches excludes the item together with its subtree.
//! Filters never hide items; `visible = false` is the rendering-side switch.

use std::borrow::Cow;

use regex::Regex;
use tracing::warn;

use conceptbuild_shared::{FilterConfig, FilterKind};

use crate::item::TopicItem;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A predicate that excludes topics from a build.
pub trait ContentFilter: std::fmt::Debug {
    /// Human-readable filter name for tracing.
    fn name(&self) -> &str;

    /// A filter with nothing to match against is inapplicable.
    fn is_valid(&self) -> bool;

    fn enabled(&self) -> bool;

    /// Returns `true` if `item` should be excluded.
    fn filter(&self, item: &TopicItem) -> bool;
}

// ---------------------------------------------------------------------------
// Built-in filters
// ---------------------------------------------------------------------------

/// Excludes items filed under any of the listed categories.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    categories: Vec<String>,
    enabled: bool,
}

impl CategoryFilter {
    pub fn new<S: AsRef<str>>(categories: &[S]) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl ContentFilter for CategoryFilter {
    fn name(&self) -> &str {
        "category"
    }

    fn is_valid(&self) -> bool {
        !self.categories.is_empty()
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn filter(&self, item: &TopicItem) -> bool {
        item.categories.iter().any(|filed| {
            self.categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(filed))
        })
    }
}

/// Which item field a [`PatternFilter`] matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternField {
    /// The item title.
    Title,
    /// The authored relative path, with `/` separators.
    Path,
}

/// Regex filter over one item field. Excludes items whose field matches
/// any pattern.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    field: PatternField,
    patterns: Vec<Regex>,
    valid: bool,
    enabled: bool,
}

impl PatternFilter {
    pub fn new<S: AsRef<str>>(field: PatternField, patterns: &[S]) -> Self {
        let mut compiled = Vec::with_capacity(patterns.len());
        let mut valid = !patterns.is_empty();
        for pattern in patterns {
            match Regex::new(pattern.as_ref()) {
                Ok(re) => compiled.push(re),
                Err(e) => {
                    warn!(pattern = pattern.as_ref(), error = %e, "invalid filter pattern");
                    valid = false;
                }
            }
        }
        Self {
            field,
            patterns: compiled,
            valid,
            enabled: true,
        }
    }

    pub fn title<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self::new(PatternField::Title, patterns)
    }

    pub fn path<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self::new(PatternField::Path, patterns)
    }

    pub fn field(&self) -> PatternField {
        self.field
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl ContentFilter for PatternFilter {
    fn name(&self) -> &str {
        match self.field {
            PatternField::Title => "title",
            PatternField::Path => "path",
        }
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn filter(&self, item: &TopicItem) -> bool {
        let subject: Cow<'_, str> = match self.field {
            PatternField::Title => Cow::Borrowed(&item.title),
            PatternField::Path => Cow::Owned(item.source_path.replace('\\', "/")),
        };
        self.patterns.iter().any(|re| re.is_match(&subject))
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Ordered filters, evaluated short-circuit.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn ContentFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from `[[filters]]` config entries, in order.
    pub fn from_config(configs: &[FilterConfig]) -> Self {
        let mut chain = Self::new();
        for config in configs {
            let filter: Box<dyn ContentFilter> = match config.kind {
                FilterKind::Category => {
                    let mut f = CategoryFilter::new(&config.values);
                    f.set_enabled(config.enabled);
                    Box::new(f)
                }
                FilterKind::Title => {
                    let mut f = PatternFilter::title(&config.values);
                    f.set_enabled(config.enabled);
                    Box::new(f)
                }
                FilterKind::Path => {
                    let mut f = PatternFilter::path(&config.values);
                    f.set_enabled(config.enabled);
                    Box::new(f)
                }
            };
            chain.push(filter);
        }
        chain
    }

    pub fn push(&mut self, filter: Box<dyn ContentFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The first enabled, valid filter that excludes `item`.
    pub fn matching(&self, item: &TopicItem) -> Option<&dyn ContentFilter> {
        self.filters
            .iter()
            .filter(|f| f.enabled() && f.is_valid())
            .find(|f| f.filter(item))
            .map(|f| &**f)
    }

    /// Returns `true` if any applicable filter excludes `item`.
    pub fn filter(&self, item: &TopicItem) -> bool {
        self.matching(item).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, path: &str, categories: &[&str]) -> TopicItem {
        let mut item = TopicItem::topic("aaaaaaaa-0000-0000-0000-000000000001", title)
            .with_document(path, std::path::Path::new("/docs"));
        item.categories = categories.iter().map(|c| c.to_string()).collect();
        item
    }

    #[test]
    fn empty_chain_excludes_nothing() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        assert!(!chain.filter(&item("Anything", "a.xml", &["internal"])));
    }

    #[test]
    fn disabled_filter_does_not_short_circuit() {
        let mut first = CategoryFilter::new(&["internal"]);
        first.set_enabled(false);
        let second = PatternFilter::title(&["^Draft"]);

        let mut chain = FilterChain::new();
        chain.push(Box::new(first));
        chain.push(Box::new(second));

        let draft = item("Draft notes", "notes.xml", &["internal"]);
        assert!(chain.filter(&draft));
        assert_eq!(chain.matching(&draft).map(|f| f.name()), Some("title"));

        // the disabled category filter alone would have matched
        assert!(!chain.filter(&item("Release notes", "notes.xml", &["internal"])));
    }

    #[test]
    fn invalid_filters_are_skipped() {
        let mut chain = FilterChain::new();
        chain.push(Box::new(CategoryFilter::new::<&str>(&[])));
        chain.push(Box::new(PatternFilter::title(&["(unclosed"])));
        assert!(!chain.filter(&item("(unclosed", "a.xml", &[])));
    }

    #[test]
    fn category_and_path_matching() {
        let categories = CategoryFilter::new(&["Internal"]);
        assert!(categories.filter(&item("A", "a.xml", &["internal"])));
        assert!(!categories.filter(&item("A", "a.xml", &["public"])));

        let paths = PatternFilter::path(&["^drafts/"]);
        assert!(paths.filter(&item("A", "drafts\\a.xml", &[])));
        assert!(!paths.filter(&item("A", "guide/a.xml", &[])));
    }

    #[test]
    fn pattern_field_selects_subject() {
        let by_title = PatternFilter::new(PatternField::Title, &["^Guide"]);
        let by_path = PatternFilter::new(PatternField::Path, &["^Guide"]);
        assert_eq!(by_title.field(), PatternField::Title);
        assert_eq!((by_title.name(), by_path.name()), ("title", "path"));

        let titled = item("Guide intro", "intro.xml", &[]);
        assert!(by_title.filter(&titled));
        assert!(!by_path.filter(&titled));

        let pathed = item("Intro", "Guide/intro.xml", &[]);
        assert!(!by_title.filter(&pathed));
        assert!(by_path.filter(&pathed));
    }

    #[test]
    fn chain_from_config_keeps_order_and_flags() {
        let configs = vec![
            FilterConfig {
                kind: FilterKind::Path,
                values: vec!["^old/".into()],
                enabled: false,
            },
            FilterConfig {
                kind: FilterKind::Category,
                values: vec!["beta".into()],
                enabled: true,
            },
        ];
        let chain = FilterChain::from_config(&configs);
        assert_eq!(chain.len(), 2);
        assert!(!chain.filter(&item("A", "old/a.xml", &[])));
        assert!(chain.filter(&item("A", "old/a.xml", &["beta"])));
    }
}
