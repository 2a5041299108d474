//! Markup → text rendering for the built-in fetcher
//!
//! Produces the simplified markdown-like body the line classifier consumes,
//! a rawer capture used as the too-short fallback, page metadata and the
//! page's outbound links.

use super::page::{PageLinks, PageMetadata};
use super::request::FetchRequest;
use crate::url::{normalize_url, same_site};
use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements never rendered
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "svg", "iframe", "canvas",
];

/// Elements rendered as part of the surrounding paragraph
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em", "i", "img",
    "ins", "kbd", "label", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup",
    "time", "u", "var", "wbr",
];

/// Class or id fragments marking popups and consent banners
const OVERLAY_MARKERS: &[&str] = &["modal", "overlay", "popup", "cookie", "consent"];

/// Extracts the page title and meta description
pub fn extract_metadata(document: &Html) -> PageMetadata {
    PageMetadata {
        title: extract_title(document),
        description: extract_description(document),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_description(document: &Html) -> Option<String> {
    ["meta[name='description']", "meta[property='og:description']"]
        .iter()
        .filter_map(|rule| Selector::parse(rule).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .filter_map(|element| element.value().attr("content"))
                .map(collapse_whitespace)
                .find(|s| !s.is_empty())
        })
}

/// Extracts normalized outbound links, split by site relative to `page_url`
///
/// Links from `<a href>` and `<link rel="canonical">` are kept; download
/// links, script/mail/phone/data URIs and same-page anchors are not. Each
/// link appears once, in document order.
pub fn extract_links(document: &Html, page_url: &Url) -> PageLinks {
    let mut links = PageLinks::default();
    let mut seen = HashSet::new();

    let mut push = |href: &str| {
        let Some(url) = resolve_link(href, page_url) else {
            return;
        };
        if !seen.insert(url.to_string()) {
            return;
        }
        if same_site(&url, page_url) {
            links.internal.push(url.to_string());
        } else {
            links.external.push(url.to_string());
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

/// Resolves an href against the page and normalizes it
///
/// Returns None for links that should never be followed.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    normalize_url(href, Some(base_url)).ok()
}

/// Renders the page body as simplified markdown
///
/// Headings, lists, quotes, code blocks and tables keep their markdown
/// markers; excluded tags and (optionally) overlays are dropped.
pub fn render_markdown(document: &Html, base: &Url, request: &FetchRequest) -> String {
    Renderer {
        base,
        keep_links: request.markdown.keep_links,
        keep_images: request.markdown.keep_images,
        body_width: request.markdown.body_width,
        excluded_tags: &request.excluded_tags,
        remove_overlays: request.remove_overlays,
        blocks: Vec::new(),
    }
    .render(document)
}

/// Renders every text block of the page, chrome included, without links
pub fn render_fallback_text(document: &Html, base: &Url) -> String {
    Renderer {
        base,
        keep_links: false,
        keep_images: false,
        body_width: 0,
        excluded_tags: &[],
        remove_overlays: false,
        blocks: Vec::new(),
    }
    .render(document)
}

struct Renderer<'a> {
    base: &'a Url,
    keep_links: bool,
    keep_images: bool,
    body_width: usize,
    excluded_tags: &'a [String],
    remove_overlays: bool,
    blocks: Vec<String>,
}

impl Renderer<'_> {
    fn render(mut self, document: &Html) -> String {
        let body = Selector::parse("body")
            .ok()
            .and_then(|selector| document.select(&selector).next());

        match body {
            Some(body) => self.render_container(*body),
            None => self.render_container(document.tree.root()),
        }

        self.blocks.join("\n\n")
    }

    fn is_dropped(&self, element: &Element) -> bool {
        let name = element.name();
        if SKIPPED_TAGS.contains(&name)
            || self
                .excluded_tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(name))
        {
            return true;
        }

        self.remove_overlays && is_overlay(element)
    }

    /// Renders a block container, gathering loose inline content into paragraphs
    fn render_container(&mut self, node: NodeRef<'_, Node>) {
        let mut inline = String::new();

        for child in node.children() {
            match child.value() {
                Node::Text(text) => inline.push_str(text),
                Node::Element(element) => {
                    if self.is_dropped(element) {
                        continue;
                    }
                    if INLINE_TAGS.contains(&element.name()) {
                        self.render_inline(child, &mut inline);
                    } else {
                        self.flush_paragraph(&mut inline);
                        self.render_block(child, element);
                    }
                }
                _ => {}
            }
        }

        self.flush_paragraph(&mut inline);
    }

    fn render_block(&mut self, node: NodeRef<'_, Node>, element: &Element) {
        match element.name() {
            name @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let text = self.inline_text(node);
                if !text.is_empty() {
                    self.blocks.push(format!("{} {}", "#".repeat(level), text));
                }
            }
            "p" => {
                let text = self.inline_text(node);
                self.push_paragraph(text);
            }
            "pre" => {
                let code = raw_text(node);
                let code = code.trim_matches('\n');
                if !code.trim().is_empty() {
                    self.blocks.push(format!("```\n{}\n```", code));
                }
            }
            "ul" | "ol" => self.render_list(node, element.name() == "ol"),
            "blockquote" => {
                let text = self.inline_text(node);
                if !text.is_empty() {
                    self.blocks.push(format!("> {}", text));
                }
            }
            "table" => self.render_table(node),
            "hr" => {}
            _ => self.render_container(node),
        }
    }

    fn render_list(&mut self, node: NodeRef<'_, Node>, ordered: bool) {
        let mut lines = Vec::new();

        for child in node.children() {
            let Some(element) = child.value().as_element() else {
                continue;
            };
            if element.name() != "li" || self.is_dropped(element) {
                continue;
            }

            let text = self.inline_text(child);
            if text.is_empty() {
                continue;
            }

            if ordered {
                lines.push(format!("{}. {}", lines.len() + 1, text));
            } else {
                lines.push(format!("- {}", text));
            }
        }

        if !lines.is_empty() {
            self.blocks.push(lines.join("\n"));
        }
    }

    fn render_table(&mut self, node: NodeRef<'_, Node>) {
        let mut rows = Vec::new();

        for row in node.descendants() {
            if row.value().as_element().map(|e| e.name()) != Some("tr") {
                continue;
            }
            let cells = row
                .children()
                .filter(|cell| {
                    matches!(
                        cell.value().as_element().map(|e| e.name()),
                        Some("td") | Some("th")
                    )
                })
                .map(|cell| self.inline_text(cell))
                .collect::<Vec<_>>();

            if cells.iter().any(|c| !c.is_empty()) {
                rows.push(format!("| {} |", cells.join(" | ")));
            }
        }

        if !rows.is_empty() {
            self.blocks.push(rows.join("\n"));
        }
    }

    fn inline_text(&self, node: NodeRef<'_, Node>) -> String {
        let mut out = String::new();
        for child in node.children() {
            self.render_inline(child, &mut out);
        }
        collapse_whitespace(&out)
    }

    fn render_inline(&self, node: NodeRef<'_, Node>, out: &mut String) {
        let element = match node.value() {
            Node::Text(text) => {
                out.push_str(text);
                return;
            }
            Node::Element(element) => element,
            _ => return,
        };

        if self.is_dropped(element) {
            return;
        }

        match element.name() {
            "br" | "wbr" => out.push(' '),
            "img" => {
                if let (true, Some(src)) = (self.keep_images, element.attr("src")) {
                    let alt = collapse_whitespace(element.attr("alt").unwrap_or(""));
                    out.push_str(&format!("![{}]({})", alt, self.absolute(src)));
                }
            }
            "a" => {
                let text = self.inline_text(node);
                match element.attr("href") {
                    Some(href) if self.keep_links && !text.is_empty() && !href.starts_with('#') => {
                        out.push_str(&format!("[{}]({})", text, self.absolute(href)));
                    }
                    _ => out.push_str(&text),
                }
            }
            "code" => {
                let text = self.inline_text(node);
                if !text.is_empty() {
                    out.push_str(&format!("`{}`", text));
                }
            }
            "strong" | "b" => {
                let text = self.inline_text(node);
                if !text.is_empty() {
                    out.push_str(&format!("**{}**", text));
                }
            }
            name => {
                let block = !INLINE_TAGS.contains(&name);
                if block {
                    out.push(' ');
                }
                for child in node.children() {
                    self.render_inline(child, out);
                }
                if block {
                    out.push(' ');
                }
            }
        }
    }

    fn flush_paragraph(&mut self, inline: &mut String) {
        let text = collapse_whitespace(inline);
        inline.clear();
        self.push_paragraph(text);
    }

    fn push_paragraph(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        if self.body_width > 0 {
            self.blocks.push(wrap(&text, self.body_width));
        } else {
            self.blocks.push(text);
        }
    }

    fn absolute(&self, href: &str) -> String {
        self.base
            .join(href.trim())
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}

fn is_overlay(element: &Element) -> bool {
    let mut marks = element.classes().map(str::to_ascii_lowercase).collect::<Vec<_>>();
    if let Some(id) = element.id() {
        marks.push(id.to_ascii_lowercase());
    }

    marks
        .iter()
        .any(|mark| OVERLAY_MARKERS.iter().any(|marker| mark.contains(marker)))
}

/// Text of a subtree with whitespace left as-is
fn raw_text(node: NodeRef<'_, Node>) -> String {
    node.descendants()
        .filter_map(|n| n.value().as_text().map(|t| t.to_string()))
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap; words longer than `width` get a line of their own
fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlSettings;

    fn base_url() -> Url {
        Url::parse("https://example.com/docs/page").unwrap()
    }

    fn capture_request() -> FetchRequest {
        FetchRequest::capture(base_url(), &CrawlSettings::default(), None)
    }

    fn discovery_request() -> FetchRequest {
        FetchRequest::discovery(base_url(), &CrawlSettings::default())
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test   Page  </title></head><body></body></html>"#;
        let metadata = extract_metadata(&Html::parse_document(html));
        assert_eq!(metadata.title.as_deref(), Some("Test Page"));
        assert_eq!(metadata.description, None);
    }

    #[test]
    fn test_extract_description_falls_back_to_open_graph() {
        let html = r#"<html><head>
            <meta property="og:description" content="Shared summary">
        </head><body></body></html>"#;
        let metadata = extract_metadata(&Html::parse_document(html));
        assert_eq!(metadata.description.as_deref(), Some("Shared summary"));
    }

    #[test]
    fn test_extract_links_splits_by_site() {
        let html = r##"<html><body>
            <a href="/docs/next">Next</a>
            <a href="https://other.org/page">Elsewhere</a>
            <a href="/docs/next#part">Next again</a>
            <a href="#top">Top</a>
            <a href="mailto:team@example.com">Mail</a>
            <a href="javascript:void(0)">Nothing</a>
            <a href="/files/guide.pdf" download>Download</a>
        </body></html>"##;
        let links = extract_links(&Html::parse_document(html), &base_url());

        assert_eq!(links.internal, vec!["https://example.com/docs/next"]);
        assert_eq!(links.external, vec!["https://other.org/page"]);
    }

    #[test]
    fn test_extract_canonical_link() {
        let html = r#"<html><head><link rel="canonical" href="https://example.com/docs/page/"></head></html>"#;
        let links = extract_links(&Html::parse_document(html), &base_url());
        assert_eq!(links.internal, vec!["https://example.com/docs/page"]);
    }

    #[test]
    fn test_render_block_structure() {
        let html = r#"<html><body>
            <h1>Queue guide</h1>
            <p>Jobs are <strong>durable</strong> and use <code>enqueue()</code>.</p>
            <ul><li>First item</li><li>Second item</li></ul>
            <ol><li>Install</li><li>Run</li></ol>
            <pre>let x = 1;
let y = 2;</pre>
        </body></html>"#;
        let markdown =
            render_markdown(&Html::parse_document(html), &base_url(), &discovery_request());

        assert_eq!(
            markdown,
            "# Queue guide\n\n\
             Jobs are **durable** and use `enqueue()`.\n\n\
             - First item\n- Second item\n\n\
             1. Install\n2. Run\n\n\
             ```\nlet x = 1;\nlet y = 2;\n```"
        );
    }

    #[test]
    fn test_render_links_and_images() {
        let html = r#"<body><p>See <a href="/docs/other">the other page</a> <img src="/img/a.png" alt="diagram"></p></body>"#;
        let markdown =
            render_markdown(&Html::parse_document(html), &base_url(), &discovery_request());
        assert_eq!(
            markdown,
            "See [the other page](https://example.com/docs/other) ![diagram](https://example.com/img/a.png)"
        );
    }

    #[test]
    fn test_capture_drops_excluded_tags_and_overlays() {
        let html = r#"<body>
            <nav><a href="/">Home</a></nav>
            <header>Site header</header>
            <div class="cookie-banner">We use cookies</div>
            <main><p>Actual article text.</p></main>
            <footer>Footer text</footer>
        </body>"#;
        let markdown =
            render_markdown(&Html::parse_document(html), &base_url(), &capture_request());
        assert_eq!(markdown, "Actual article text.");
    }

    #[test]
    fn test_fallback_text_keeps_chrome_without_links() {
        let html = r#"<body>
            <nav><a href="/">Home</a></nav>
            <main><p>Actual <a href="/x">article</a> text.</p></main>
            <script>var tracking = true;</script>
        </body>"#;
        let text = render_fallback_text(&Html::parse_document(html), &base_url());
        assert_eq!(text, "Home\n\nActual article text.");
    }

    #[test]
    fn test_loose_inline_text_becomes_paragraphs() {
        let html = r#"<body><div>Intro text <em>here</em><p>Inner paragraph</p>tail</div></body>"#;
        let text = render_fallback_text(&Html::parse_document(html), &base_url());
        assert_eq!(text, "Intro text here\n\nInner paragraph\n\ntail");
    }

    #[test]
    fn test_long_paragraph_survives_cleaning_intact() {
        let html = r#"<body>
            <h1>Worker pools</h1>
            <p>A worker pool bounds how many jobs run at once and hands each job to the next idle worker, so tune the pool size against every worker it spawns, see the API reference for details.</p>
        </body>"#;
        let markdown =
            render_markdown(&Html::parse_document(html), &base_url(), &capture_request());
        assert_eq!(markdown.lines().count(), 3);

        let cleaned = crate::clean::ContentCleaner::default().clean(&markdown, "Worker pools");
        assert!(cleaned.contains("every worker it spawns, see the API reference for details."));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three four", 9), "one two\nthree\nfour");
        assert_eq!(wrap("short", 120), "short");
    }
}
