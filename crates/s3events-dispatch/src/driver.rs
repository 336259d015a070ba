//! Object-stream driver ports
//!
//! Listing and notification-config reads are provider I/O; the replay loop
//! only sees these traits.

use async_trait::async_trait;
use s3events_core::types::{NotificationConfiguration, S3Path, StorageObjectRef};
use s3events_core::Result;
use std::sync::Arc;
use tracing::debug;

/// One page of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub objects: Vec<StorageObjectRef>,
    /// Present while more pages remain
    pub next_continuation_token: Option<String>,
}

/// Paginated bucket listing (ListObjectsV2 semantics)
#[async_trait]
pub trait ObjectLister: Send + Sync {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage>;
}

/// Reads the destinations registered on a bucket
#[async_trait]
pub trait NotificationConfigSource: Send + Sync {
    async fn load(&self, bucket: &str) -> Result<NotificationConfiguration>;
}

/// Lazy page iterator over every object under a prefix
pub struct ObjectPages {
    lister: Arc<dyn ObjectLister>,
    path: S3Path,
    token: Option<String>,
    finished: bool,
}

impl ObjectPages {
    pub fn new(lister: Arc<dyn ObjectLister>, path: S3Path) -> Self {
        Self {
            lister,
            path,
            token: None,
            finished: false,
        }
    }

    /// Continue a listing from a token returned by [`ObjectPages::resume_token`]
    pub fn resume(lister: Arc<dyn ObjectLister>, path: S3Path, token: impl Into<String>) -> Self {
        Self {
            lister,
            path,
            token: Some(token.into()),
            finished: false,
        }
    }

    /// Token of the next page to fetch, if any
    pub fn resume_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Fetch the next page; `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<StorageObjectRef>>> {
        if self.finished {
            return Ok(None);
        }

        let page = self
            .lister
            .list_page(&self.path.bucket, &self.path.prefix, self.token.as_deref())
            .await?;

        debug!(
            "Listed {} object(s) in {} (truncated: {})",
            page.objects.len(),
            self.path,
            page.next_continuation_token.is_some()
        );

        self.token = page.next_continuation_token;
        self.finished = self.token.is_none();

        Ok(Some(page.objects))
    }
}
