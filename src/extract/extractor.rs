use super::path_query::PathQuery;
use super::templates::{get_template, SelectorTemplate};
use super::ExtractionMethod;
use crate::config::ExtractionConfig;
use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node, Selector};
use serde::Serialize;
use std::collections::HashSet;

/// Elements whose text never counts as content
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Length of the normalized prefix used to spot duplicate blocks
const DEDUP_PREFIX_CHARS: usize = 100;

/// Content and exclusion rules for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorRules {
    pub selectors: Vec<String>,
    pub queries: Vec<String>,
    pub exclude_selectors: Vec<String>,
    pub exclude_queries: Vec<String>,
}

impl SelectorRules {
    pub fn from_template(template: &SelectorTemplate) -> Self {
        let owned =
            |rules: &[&str]| -> Vec<String> { rules.iter().map(|r| r.to_string()).collect() };
        Self {
            selectors: owned(template.selectors),
            queries: owned(template.queries),
            exclude_selectors: owned(template.exclude_selectors),
            exclude_queries: owned(template.exclude_queries),
        }
    }

    /// Builds rules from settings: template rules first, then custom ones
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let mut rules = config
            .template
            .as_deref()
            .and_then(get_template)
            .map(Self::from_template)
            .unwrap_or_default();

        append_unique(&mut rules.selectors, &config.selectors);
        append_unique(&mut rules.queries, &config.queries);
        append_unique(&mut rules.exclude_selectors, &config.exclude_selectors);
        append_unique(&mut rules.exclude_queries, &config.exclude_queries);
        rules
    }

    /// True when there is nothing to extract with
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty() && self.queries.is_empty()
    }
}

fn append_unique(target: &mut Vec<String>, extra: &[String]) {
    for rule in extra {
        if !target.contains(rule) {
            target.push(rule.clone());
        }
    }
}

/// Side-by-side extraction output for trying out rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectorTestReport {
    pub selector: Option<String>,
    pub path_query: Option<String>,
    pub combined: Option<String>,
}

/// Pulls main-content text out of markup using structural rules
///
/// Each rule runs independently. Nodes matched by one rule are emitted in
/// document order and every emitted block is separated by a blank line. A
/// matched node is dropped when it or one of its ancestors matches an
/// exclusion rule, and excluded descendants are left out of its text.
/// Malformed rules are skipped.
///
/// # Example
///
/// ```
/// use pagesift::extract::{ExtractionMethod, SelectorExtractor, SelectorRules};
///
/// let rules = SelectorRules {
///     selectors: vec!["article".to_string()],
///     exclude_selectors: vec![".ad".to_string()],
///     ..Default::default()
/// };
/// let extractor = SelectorExtractor::new(ExtractionMethod::Selector, rules);
/// let html = r#"<article><p>Body</p><div class="ad">Buy</div></article>"#;
/// assert_eq!(extractor.extract(html), "Body");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectorExtractor {
    method: ExtractionMethod,
    rules: SelectorRules,
}

impl SelectorExtractor {
    pub fn new(method: ExtractionMethod, rules: SelectorRules) -> Self {
        Self { method, rules }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.method, SelectorRules::from_config(config))
    }

    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    pub fn rules(&self) -> &SelectorRules {
        &self.rules
    }

    /// True when the extractor has any content rule to run
    pub fn is_configured(&self) -> bool {
        match self.method {
            ExtractionMethod::Selector => !self.rules.selectors.is_empty(),
            ExtractionMethod::PathQuery => !self.rules.queries.is_empty(),
            ExtractionMethod::Combined => !self.rules.is_empty(),
        }
    }

    /// Runs the configured method over a page
    pub fn extract(&self, html: &str) -> String {
        match self.method {
            ExtractionMethod::Selector => Self::extract_by_selector(
                html,
                &self.rules.selectors,
                &self.rules.exclude_selectors,
            ),
            ExtractionMethod::PathQuery => Self::extract_by_path_query(
                html,
                &self.rules.queries,
                &self.rules.exclude_queries,
            ),
            ExtractionMethod::Combined => Self::extract_combined(html, &self.rules),
        }
    }

    /// Extracts text matched by CSS selectors
    pub fn extract_by_selector(
        html: &str,
        selectors: &[String],
        exclude_selectors: &[String],
    ) -> String {
        if html.trim().is_empty() || selectors.is_empty() {
            return String::new();
        }

        let document = Html::parse_document(html);
        let excluded: HashSet<NodeId> = selector_matches(&document, exclude_selectors)
            .into_iter()
            .flatten()
            .collect();
        let groups = selector_matches(&document, selectors);

        collect_blocks(&document, groups, &excluded).join("\n\n")
    }

    /// Extracts text matched by path queries
    pub fn extract_by_path_query(
        html: &str,
        queries: &[String],
        exclude_queries: &[String],
    ) -> String {
        if html.trim().is_empty() || queries.is_empty() {
            return String::new();
        }

        let document = Html::parse_document(html);
        let excluded: HashSet<NodeId> = query_matches(&document, exclude_queries)
            .into_iter()
            .flatten()
            .collect();
        let groups = query_matches(&document, queries);

        collect_blocks(&document, groups, &excluded).join("\n\n")
    }

    /// Extracts with both rule kinds and drops near-duplicate blocks
    ///
    /// Both kinds of exclusion rule apply to both kinds of content rule.
    /// Blocks are compared on a normalized prefix and the first occurrence
    /// wins.
    pub fn extract_combined(html: &str, rules: &SelectorRules) -> String {
        if html.trim().is_empty() || rules.is_empty() {
            return String::new();
        }

        let document = Html::parse_document(html);
        let excluded: HashSet<NodeId> = selector_matches(&document, &rules.exclude_selectors)
            .into_iter()
            .chain(query_matches(&document, &rules.exclude_queries))
            .flatten()
            .collect();

        let mut blocks = collect_blocks(
            &document,
            selector_matches(&document, &rules.selectors),
            &excluded,
        );
        blocks.extend(collect_blocks(
            &document,
            query_matches(&document, &rules.queries),
            &excluded,
        ));

        dedup_blocks(blocks).join("\n\n")
    }

    /// Runs each method separately so their output can be compared
    pub fn test_selectors(
        html: &str,
        selectors: &[String],
        queries: &[String],
    ) -> SelectorTestReport {
        let mut report = SelectorTestReport::default();

        if !selectors.is_empty() {
            report.selector = Some(Self::extract_by_selector(html, selectors, &[]));
        }
        if !queries.is_empty() {
            report.path_query = Some(Self::extract_by_path_query(html, queries, &[]));
        }
        if !selectors.is_empty() && !queries.is_empty() {
            let rules = SelectorRules {
                selectors: selectors.to_vec(),
                queries: queries.to_vec(),
                ..Default::default()
            };
            report.combined = Some(Self::extract_combined(html, &rules));
        }

        report
    }
}

/// Normalized prefix used to compare blocks
pub fn dedup_key(block: &str) -> String {
    block
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .take(DEDUP_PREFIX_CHARS)
        .collect()
}

fn dedup_blocks(blocks: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    blocks
        .into_iter()
        .filter(|block| seen.insert(dedup_key(block)))
        .collect()
}

/// Matches each selector separately, skipping the ones that fail to parse
fn selector_matches(document: &Html, selectors: &[String]) -> Vec<Vec<NodeId>> {
    selectors
        .iter()
        .filter_map(|raw| match Selector::parse(raw) {
            Ok(selector) => Some(document.select(&selector).map(|el| el.id()).collect()),
            Err(e) => {
                tracing::debug!("Skipping invalid selector '{}': {}", raw, e);
                None
            }
        })
        .collect()
}

/// Matches each path query separately, skipping the ones that fail to parse
fn query_matches(document: &Html, queries: &[String]) -> Vec<Vec<NodeId>> {
    queries
        .iter()
        .filter_map(|raw| match PathQuery::parse(raw) {
            Ok(query) => Some(query.select(document)),
            Err(e) => {
                tracing::debug!("Skipping invalid path query: {}", e);
                None
            }
        })
        .collect()
}

/// Turns matched nodes into text blocks
///
/// A node already emitted, or nested in one already emitted, is not emitted
/// again.
fn collect_blocks(
    document: &Html,
    groups: Vec<Vec<NodeId>>,
    excluded: &HashSet<NodeId>,
) -> Vec<String> {
    let mut emitted: HashSet<NodeId> = HashSet::new();
    let mut blocks = Vec::new();

    for id in groups.into_iter().flatten() {
        let Some(node) = document.tree.get(id) else {
            continue;
        };

        if emitted.contains(&id) || node.ancestors().any(|a| emitted.contains(&a.id())) {
            continue;
        }
        if excluded.contains(&id) || node.ancestors().any(|a| excluded.contains(&a.id())) {
            continue;
        }

        emitted.insert(id);

        let mut parts = Vec::new();
        collect_text(node, excluded, &mut parts);
        if !parts.is_empty() {
            blocks.push(parts.join(" "));
        }
    }

    blocks
}

fn collect_text(node: NodeRef<'_, Node>, excluded: &HashSet<NodeId>, parts: &mut Vec<String>) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
            Node::Element(element) => {
                if SKIPPED_TAGS.contains(&element.name()) || excluded.contains(&child.id()) {
                    continue;
                }
                collect_text(child, excluded, parts);
            }
            _ => {}
        }
    }
}
