// Catalog snapshot: the immutable item list a page session works against.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{ApiError, CatalogApi};
use crate::notify::{NoticeKind, Notifier};

/// A rentable costume record as exposed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub available: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Immutable snapshot fetched once per session and threaded into the flow
/// explicitly; there is no global item cache.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    items: Vec<CatalogItem>,
}

impl CatalogSnapshot {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Unknown ids degrade to a generic label instead of failing.
    pub fn title_for(&self, id: u32) -> String {
        match self.get(id) {
            Some(item) => item.title.clone(),
            None => format!("Item #{id}"),
        }
    }
}

/// Fetches the catalog once. Failures are surfaced through the notifier and
/// returned to the caller; nothing is retried.
pub async fn load_catalog(
    api: &dyn CatalogApi,
    notifier: &dyn Notifier,
) -> Result<CatalogSnapshot, ApiError> {
    match api.list_items().await {
        Ok(items) => {
            debug!("catalog loaded: {} items", items.len());
            Ok(CatalogSnapshot::new(items))
        }
        Err(err) => {
            notifier.notify(
                NoticeKind::Error,
                &format!("Failed to load the catalog: {err}"),
            );
            Err(err)
        }
    }
}
