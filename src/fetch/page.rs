/// Links found on a page, split by site relative to the page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

impl PageLinks {
    pub fn len(&self) -> usize {
        self.internal.len() + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && self.external.is_empty()
    }

    /// Internal links first, then external, each in document order
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.internal
            .iter()
            .chain(self.external.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// What the fetch collaborator returns for one page
///
/// A collaborator may signal failure either by returning an error or by
/// returning a page with `success` unset and an `error_message`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub success: bool,
    /// Simplified markdown-like rendering of the body
    pub markdown: String,
    /// Raw markup
    pub html: String,
    /// Rawer plain capture used when the cleaned body comes out too short
    pub fallback_text: Option<String>,
    pub links: PageLinks,
    pub metadata: PageMetadata,
    pub error_message: Option<String>,
}

impl FetchedPage {
    /// A page the collaborator could not load
    pub fn failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.description.as_deref()
    }
}
