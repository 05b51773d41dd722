// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::http::{FetchRequest, FetchResponse, Fetcher};
use crate::urls;

/// Marker error for a request abandoned through its cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request cancelled")
    }
}

impl std::error::Error for Cancelled {}

pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<Cancelled>())
}

/// Everything one resolution request needs; created per call, never shared.
pub struct RequestContext<'a, F: Fetcher> {
    pub fetcher: &'a F,
    pub cancel: &'a CancellationToken,
    pub base_url: String,
    pub user_agent: &'a str,
    pub timeout: Duration,
}

impl<'a, F: Fetcher> RequestContext<'a, F> {
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        Ok(())
    }

    /// Fetch `url` with a `Referer` of the page that linked to it.
    pub async fn fetch(&self, url: &str, referer: &str) -> Result<FetchResponse> {
        self.checkpoint()?;

        let request = FetchRequest::get(url)
            .header("Referer", referer)
            .header("User-Agent", self.user_agent)
            .timeout(self.timeout);

        debug!("Requesting: {} (referer: {})", url, referer);

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Cancelled.into()),
            response = self.fetcher.fetch(request) => response?,
        };

        response.ensure_success(url)
    }

    pub async fn get_page(&self, url: &str, referer: &str) -> Result<String> {
        Ok(self.fetch(url, referer).await?.body)
    }

    /// Resolve a title reference or path against the provider's live domain.
    pub fn absolute(&self, reference: &str) -> Option<String> {
        urls::normalize(reference, &self.base_url)
    }
}
