//! Remote Table Client
//!
//! CRUD against the bookmarks table through the store's REST dialect.
//! Reads are scoped by owner; writes are keyed by row id and rely on the
//! store's row-level policy for authorization.

use reqwest::{RequestBuilder, Response};
use uuid::Uuid;

use crate::egui_app::context::StoreContext;
use crate::shared::bookmark::{Bookmark, BookmarkPatch, NewBookmark};
use crate::shared::error::StoreError;

/// Blocking access to the bookmarks table. Implementations are called from
/// worker threads, never from the UI thread.
pub trait BookmarkStore: Send + Sync {
    /// All rows owned by `owner_id`, identifier descending.
    fn list(&self, owner_id: Uuid) -> Result<Vec<Bookmark>, StoreError>;

    /// Insert one row; the store assigns its id.
    fn create(&self, owner_id: Uuid, title: &str, url: &str) -> Result<(), StoreError>;

    /// Replace title and url of the row with `id`.
    fn update(&self, id: Uuid, title: &str, url: &str) -> Result<(), StoreError>;

    /// Remove the row with `id`.
    fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// `BookmarkStore` over HTTP
pub struct RestStore {
    ctx: StoreContext,
    table: String,
}

impl RestStore {
    pub fn new(ctx: StoreContext) -> Self {
        let table = ctx.config().table().to_string();
        Self { ctx, table }
    }

    fn url(&self) -> String {
        self.ctx.config().rest_url(&self.table)
    }

    /// Attach the key and bearer token, or fail before touching the network.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        let token = self.ctx.access_token().ok_or(StoreError::NotAuthenticated)?;
        Ok(request
            .header("apikey", self.ctx.config().store_key())
            .bearer_auth(token))
    }
}

pub(crate) async fn check(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    Err(StoreError::http(status.as_u16(), body))
}

/// Parse a list body and hold every row to the owner that was asked for.
pub fn parse_owned_rows(body: &str, owner_id: Uuid) -> Result<Vec<Bookmark>, StoreError> {
    let rows = Bookmark::parse_rows(body)
        .map_err(|e| StoreError::shape("bookmark rows", e.to_string()))?;
    if let Some(row) = rows.iter().find(|row| !row.is_owned_by(owner_id)) {
        return Err(StoreError::ForeignRow {
            id: row.id,
            expected: owner_id,
            actual: row.owner_id,
        });
    }
    Ok(rows)
}

impl BookmarkStore for RestStore {
    fn list(&self, owner_id: Uuid) -> Result<Vec<Bookmark>, StoreError> {
        let request = self.authorize(self.ctx.http().get(self.url()))?.query(&[
            ("select", "*".to_string()),
            ("owner_id", format!("eq.{}", owner_id)),
            ("order", "id.desc".to_string()),
        ]);
        tracing::debug!("GET {} owner={}", self.url(), owner_id);

        self.ctx.block_on(async {
            let response = check(request.send().await?).await?;
            let body = response.text().await?;
            parse_owned_rows(&body, owner_id)
        })
    }

    fn create(&self, owner_id: Uuid, title: &str, url: &str) -> Result<(), StoreError> {
        let payload = NewBookmark {
            owner_id,
            title,
            url,
        };
        let request = self
            .authorize(self.ctx.http().post(self.url()))?
            .header("Prefer", "return=minimal")
            .json(&payload);
        tracing::debug!("POST {} owner={}", self.url(), owner_id);

        self.ctx.block_on(async {
            check(request.send().await?).await?;
            Ok::<(), StoreError>(())
        })
    }

    fn update(&self, id: Uuid, title: &str, url: &str) -> Result<(), StoreError> {
        let payload = BookmarkPatch { title, url };
        let request = self
            .authorize(self.ctx.http().patch(self.url()))?
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(&payload);
        tracing::debug!("PATCH {} id={}", self.url(), id);

        self.ctx.block_on(async {
            check(request.send().await?).await?;
            Ok::<(), StoreError>(())
        })
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let request = self
            .authorize(self.ctx.http().delete(self.url()))?
            .query(&[("id", format!("eq.{}", id))]);
        tracing::debug!("DELETE {} id={}", self.url(), id);

        self.ctx.block_on(async {
            check(request.send().await?).await?;
            Ok::<(), StoreError>(())
        })
    }
}
