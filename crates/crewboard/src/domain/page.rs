use serde::{Deserialize, Serialize};
use url::Url;

/// Envelope returned by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            count: 0,
            next: None,
        }
    }

    /// Page number the `next` link points at. A `next` link without a `page` parameter is
    /// read as the page after `current`.
    pub fn next_page(&self, current: u32) -> Option<u32> {
        let next = self.next.as_deref()?;
        let url = Url::parse(next)
            .or_else(|_| Url::parse("http://relative.invalid/").and_then(|base| base.join(next)))
            .ok();

        let page = url.and_then(|url| {
            url.query_pairs()
                .find(|(name, _)| name == "page")
                .and_then(|(_, value)| value.parse::<u32>().ok())
        });

        Some(page.unwrap_or(current + 1))
    }
}

/// Acknowledgement body returned by action endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}
