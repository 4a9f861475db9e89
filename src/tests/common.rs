use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::errors::{OverlapError, Result};
use crate::portfolio::PageSource;

pub use crate::portfolio::parser::fixtures::{holdings_page, page_with_tables};

enum Page {
    Html(String),
    Status(u16),
}

/// In-memory `PageSource` that records how often each URL is requested
#[derive(Default)]
pub struct StaticPages {
    pages: HashMap<String, Page>,
    calls: Mutex<HashMap<String, usize>>,
    total_calls: AtomicUsize,
}

impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holdings(mut self, url: &str, holdings: &[&str]) -> Self {
        self.pages.insert(url.to_string(), Page::Html(holdings_page(4, holdings)));
        self
    }

    pub fn with_html(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), Page::Html(html));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Page::Status(status));
        self
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for StaticPages {
    async fn get_page(&self, url: &str) -> Result<String> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        match self.pages.get(url) {
            Some(Page::Html(html)) => Ok(html.clone()),
            Some(Page::Status(status)) => Err(OverlapError::fetch(url, format!("HTTP {}", status))),
            None => Err(OverlapError::fetch(url, "connection refused")),
        }
    }
}
