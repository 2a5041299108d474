//! Built-in selector templates per site genre

/// A fixed bundle of content and exclusion rules for one kind of site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorTemplate {
    pub name: &'static str,
    pub selectors: &'static [&'static str],
    pub queries: &'static [&'static str],
    pub exclude_selectors: &'static [&'static str],
    pub exclude_queries: &'static [&'static str],
}

pub const TEMPLATES: &[SelectorTemplate] = &[
    SelectorTemplate {
        name: "blog",
        selectors: &[
            "article",
            ".post-content",
            ".entry-content",
            "main article",
            ".blog-post",
        ],
        queries: &[
            "//article",
            "//div[@class=\"post-content\"]",
            "//div[contains(@class, \"entry-content\")]",
        ],
        exclude_selectors: &[".comments", ".sidebar", ".related-posts", ".share-buttons"],
        exclude_queries: &[
            "//div[@class=\"comments\"]",
            "//aside",
            "//div[contains(@class, \"related\")]",
        ],
    },
    SelectorTemplate {
        name: "news",
        selectors: &[
            ".article-body",
            ".story-content",
            ".news-content",
            "article.main-content",
        ],
        queries: &[
            "//div[@class=\"article-body\"]",
            "//div[contains(@class, \"story-content\")]",
        ],
        exclude_selectors: &[".advertisement", ".newsletter-signup", ".trending"],
        exclude_queries: &[
            "//div[contains(@class, \"ad\")]",
            "//div[@class=\"newsletter\"]",
        ],
    },
    SelectorTemplate {
        name: "documentation",
        selectors: &[
            ".markdown-body",
            ".doc-content",
            ".documentation",
            "article.content",
        ],
        queries: &[
            "//div[@class=\"markdown-body\"]",
            "//section[@class=\"content\"]",
        ],
        exclude_selectors: &[".toc", ".nav-sidebar", ".footer-nav"],
        exclude_queries: &["//nav", "//div[@class=\"table-of-contents\"]"],
    },
    SelectorTemplate {
        name: "ecommerce",
        selectors: &[
            ".product-description",
            ".product-details",
            ".item-description",
        ],
        queries: &[
            "//div[@class=\"product-description\"]",
            "//section[contains(@class, \"product-info\")]",
        ],
        exclude_selectors: &[".reviews", ".recommendations", ".recently-viewed"],
        exclude_queries: &[
            "//div[@class=\"reviews\"]",
            "//div[contains(@class, \"recommended\")]",
        ],
    },
    SelectorTemplate {
        name: "forum",
        selectors: &[
            ".post-body",
            ".message-content",
            ".forum-post",
            ".comment-body",
        ],
        queries: &[
            "//div[@class=\"post-body\"]",
            "//div[contains(@class, \"message\")]",
        ],
        exclude_selectors: &[".signature", ".user-info", ".post-meta"],
        exclude_queries: &[
            "//div[@class=\"signature\"]",
            "//div[@class=\"user-profile\"]",
        ],
    },
];

/// Looks up a template by name, case-insensitively
///
/// `docs` and `e-commerce` are accepted as aliases.
pub fn get_template(name: &str) -> Option<&'static SelectorTemplate> {
    let name = name.trim().to_ascii_lowercase();
    let canonical = match name.as_str() {
        "docs" => "documentation",
        "e-commerce" => "ecommerce",
        other => other,
    };
    TEMPLATES.iter().find(|t| t.name == canonical)
}

pub fn template_names() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|t| t.name)
}
