//! Lazy, restartable iteration over paginated list APIs.
//!
//! List operations return a [`Pager`], which fetches pages on demand and
//! tracks the continuation token between fetches. Nothing is requested
//! until the first page is demanded. A pager can be restarted mid-listing
//! from a previously observed token via
//! [`from_continuation`](Pager::from_continuation), and supports both
//! page-level and item-level consumption.

use futures_util::stream::{self, Stream, StreamExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// One page of results plus the continuation token for the next page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Token for the next page; `None` means this is the last page.
    pub continuation_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, continuation_token: Option<String>) -> Self {
        Self {
            items,
            continuation_token,
        }
    }

    /// Whether this page terminates the listing.
    pub fn is_last(&self) -> bool {
        self.continuation_token.is_none()
    }
}

/// Future returned by a page fetcher.
pub type PageFuture<T, E> = Pin<Box<dyn Future<Output = Result<Page<T>, E>> + Send>>;

/// Fetches one page, given the continuation token from the previous page
/// (`None` for the first page).
pub type PageFetcher<T, E> = Box<dyn FnMut(Option<String>) -> PageFuture<T, E> + Send>;

/// A lazy, restartable pager over a page-fetching closure.
///
/// Iteration ends when a page arrives without a continuation token. A
/// fetch error does not advance the token, so manual iteration with
/// [`next_page`](Self::next_page) may retry the same page; the stream
/// adapters instead terminate after yielding the error.
pub struct Pager<T, E> {
    fetch: PageFetcher<T, E>,
    continuation: Option<String>,
    exhausted: bool,
}

impl<T, E> Pager<T, E> {
    /// Create a pager starting from the first page.
    pub fn new(fetch: PageFetcher<T, E>) -> Self {
        Self {
            fetch,
            continuation: None,
            exhausted: false,
        }
    }

    /// Create a pager resuming from a previously observed continuation
    /// token.
    pub fn from_continuation(fetch: PageFetcher<T, E>, token: impl Into<String>) -> Self {
        Self {
            fetch,
            continuation: Some(token.into()),
            exhausted: false,
        }
    }

    /// The token the next fetch will use, for checkpointing. `None`
    /// either before the first fetch or once the listing is exhausted.
    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation.as_deref()
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Option<Result<Page<T>, E>> {
        if self.exhausted {
            return None;
        }
        match (self.fetch)(self.continuation.clone()).await {
            Ok(page) => {
                self.continuation = page.continuation_token.clone();
                if self.continuation.is_none() {
                    self.exhausted = true;
                }
                Some(Ok(page))
            }
            // Token intentionally left untouched so the caller can retry.
            Err(e) => Some(Err(e)),
        }
    }

    /// Page-level stream. Ends after the last page, or after the first
    /// error.
    pub fn pages(self) -> impl Stream<Item = Result<Page<T>, E>> + Send
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        stream::unfold((self, false), |(mut pager, errored)| async move {
            if errored {
                return None;
            }
            match pager.next_page().await {
                Some(Ok(page)) => Some((Ok(page), (pager, false))),
                Some(Err(e)) => Some((Err(e), (pager, true))),
                None => None,
            }
        })
    }

    /// Item-level stream: the pages flattened in order.
    pub fn items(self) -> impl Stream<Item = Result<T, E>> + Send
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        self.pages().flat_map(|result| match result {
            Ok(page) => stream::iter(page.items.into_iter().map(Ok).collect::<Vec<_>>()),
            Err(e) => stream::iter(vec![Err(e)]),
        })
    }

    /// Eagerly drain every remaining page into a single `Vec`.
    pub async fn collect(mut self) -> Result<Vec<T>, E> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await {
            all.extend(page?.items);
        }
        Ok(all)
    }
}

impl<T, E> fmt::Debug for Pager<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("continuation", &self.continuation)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
