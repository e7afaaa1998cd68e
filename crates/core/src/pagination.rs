//! Continuation-token pagination
//!
//! [`collect_all_pages`] walks a [`PageSource`] until the provider returns an
//! empty page and accumulates every item in memory. Volumes per sync window
//! are small, so results are not streamed.

use async_trait::async_trait;
use bergerie_common::{pause, Pacer};
use bergerie_domain::Result;
use tracing::{debug, warn};

/// One page of results and the marker for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub continuation_token: Option<String>,
}

impl<T> Page<T> {
    pub const fn new(items: Vec<T>, continuation_token: Option<String>) -> Self {
        Self { items, continuation_token }
    }
}

/// Trait for a paged provider listing
#[async_trait]
pub trait PageSource<T: Send>: Send + Sync {
    /// Fetch the page after `continuation_token` (`None` for the first page).
    async fn fetch_page(&self, continuation_token: Option<&str>) -> Result<Page<T>>;
}

/// Fetch pages until one comes back empty.
///
/// The walk also ends when a non-empty page carries no continuation token
/// (there is nothing to pass forward) or repeats the token it was fetched
/// with. `pacer` is consulted before every request after the first.
pub async fn collect_all_pages<T: Send>(
    source: &dyn PageSource<T>,
    pacer: &dyn Pacer,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let mut pages: u32 = 0;

    loop {
        if pages > 0 {
            pause(pacer, pages).await;
        }

        let page = source.fetch_page(token.as_deref()).await?;
        pages += 1;

        if page.items.is_empty() {
            debug!(pages, total = items.len(), "empty page, pagination complete");
            break;
        }
        items.extend(page.items);

        match page.continuation_token {
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                warn!(pages, "provider repeated its continuation token, stopping");
                break;
            }
            Some(next) => token = Some(next),
            None => {
                debug!(pages, total = items.len(), "no continuation token, pagination complete");
                break;
            }
        }
    }

    Ok(items)
}
