//! Catalog controller: paginated listing, client-side search, and optimistic
//! delete with rollback.
//!
//! Every transition is a synchronous method on the controller. The async
//! helpers only wrap a transition pair around one gateway call, so a host
//! that runs requests concurrently can use `begin_*`/`apply_*` directly and
//! apply completions in whatever order they arrive.

use std::{collections::HashSet, sync::Arc};

use shared::{domain::ProductId, error::GatewayError, protocol::Product};
use tracing::{debug, info, warn};

use crate::{events::CatalogEvent, gateway::ProductGateway};

pub const FETCH_FAILED_MESSAGE: &str = "Unable to load products. Please try again later.";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete product. Restoring list.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogPhase {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Confirmation dialog state. `confirm_open` implies `target.is_some()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingDelete {
    target: Option<Product>,
    confirm_open: bool,
}

impl PendingDelete {
    pub fn target(&self) -> Option<&Product> {
        self.target.as_ref()
    }

    pub fn is_confirm_open(&self) -> bool {
        self.confirm_open
    }

    fn clear(&mut self) {
        self.target = None;
        self.confirm_open = false;
    }

    fn clear_if_target(&mut self, id: ProductId) {
        if self.target.as_ref().map(|p| p.id) == Some(id) {
            self.clear();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    offset: usize,
    limit: usize,
}

impl FetchTicket {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[derive(Debug, Clone)]
pub struct DeleteTicket {
    product: Product,
    previous: Vec<Product>,
    page_seq: u64,
}

impl DeleteTicket {
    pub fn product_id(&self) -> ProductId {
        self.product.id
    }
}

pub struct CatalogController {
    gateway: Arc<dyn ProductGateway>,
    limit: usize,
    /// Offset of the most recently requested page.
    offset: usize,
    /// Offset of the page currently shown; lags `offset` while a fetch is
    /// pending or after it failed.
    page_offset: usize,
    /// Last page as returned by the gateway.
    page: Vec<Product>,
    items: Vec<Product>,
    phase: CatalogPhase,
    error: Option<String>,
    banner: Option<String>,
    search_term: String,
    pending_delete: PendingDelete,
    /// Sequence number of the most recently issued fetch.
    fetch_seq: u64,
    /// Sequence number of the fetch that produced `page`.
    page_seq: u64,
    deletes_in_flight: HashSet<ProductId>,
    /// Confirmed deletes for the session. Remote ids are never reused, so
    /// the set only grows and filters stale copies out of later pages.
    deleted: HashSet<ProductId>,
}

impl CatalogController {
    pub fn new(gateway: Arc<dyn ProductGateway>, limit: usize) -> Self {
        Self {
            gateway,
            limit: limit.max(1),
            offset: 0,
            page_offset: 0,
            page: Vec::new(),
            items: Vec::new(),
            phase: CatalogPhase::Idle,
            error: None,
            banner: None,
            search_term: String::new(),
            pending_delete: PendingDelete::default(),
            fetch_seq: 0,
            page_seq: 0,
            deletes_in_flight: HashSet::new(),
            deleted: HashSet::new(),
        }
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn phase(&self) -> CatalogPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == CatalogPhase::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn pending_delete(&self) -> &PendingDelete {
        &self.pending_delete
    }

    /// 1-based number of the page whose items are shown.
    pub fn current_page(&self) -> usize {
        self.page_offset / self.limit + 1
    }

    /// The remote reports no total, so a full page is the only hint that
    /// another one may follow.
    pub fn has_next(&self) -> bool {
        self.page.len() >= self.limit
    }

    pub fn has_previous(&self) -> bool {
        self.page_offset > 0
    }

    pub fn visible(&self) -> Vec<&Product> {
        filter_products(&self.items, &self.search_term)
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_seq += 1;
        self.phase = CatalogPhase::Loading;
        self.error = None;
        FetchTicket {
            seq: self.fetch_seq,
            offset: self.offset,
            limit: self.limit,
        }
    }

    /// Returns false when the response belongs to a superseded fetch.
    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Product>, GatewayError>,
    ) -> bool {
        if ticket.seq != self.fetch_seq || ticket.offset != self.offset {
            debug!(
                offset = ticket.offset,
                current_offset = self.offset,
                "ignoring stale catalog response"
            );
            return false;
        }

        match result {
            Ok(mut page) => {
                if page.len() > self.limit {
                    warn!(
                        returned = page.len(),
                        limit = self.limit,
                        "gateway returned an oversized page; truncating"
                    );
                    page.truncate(self.limit);
                }
                self.page = page;
                self.page_seq = ticket.seq;
                self.page_offset = ticket.offset;
                self.items = self.without_removed(&self.page);
                self.phase = CatalogPhase::Loaded;
                self.error = None;
                debug!(offset = self.offset, count = self.items.len(), "catalog page loaded");
            }
            Err(err) => {
                // Items from the previous page stay visible behind the error.
                warn!(offset = self.offset, "failed to load catalog page: {err}");
                self.phase = CatalogPhase::Error;
                self.error = Some(FETCH_FAILED_MESSAGE.to_string());
            }
        }
        true
    }

    pub fn advance(&mut self) -> Option<FetchTicket> {
        if !self.has_next() {
            return None;
        }
        self.offset = self.page_offset + self.limit;
        Some(self.begin_fetch())
    }

    pub fn retreat(&mut self) -> Option<FetchTicket> {
        if !self.has_previous() {
            return None;
        }
        self.offset = self.page_offset.saturating_sub(self.limit);
        Some(self.begin_fetch())
    }

    pub fn request_delete(&mut self, id: ProductId) -> bool {
        let Some(product) = self.items.iter().find(|p| p.id == id).cloned() else {
            warn!(product_id = id.0, "delete requested for a product not on this page");
            return false;
        };
        self.pending_delete = PendingDelete {
            target: Some(product),
            confirm_open: true,
        };
        true
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete.clear();
    }

    /// Removes the target locally and hands back what the gateway call and
    /// a possible rollback need.
    pub fn confirm_delete(&mut self) -> Option<DeleteTicket> {
        if !self.pending_delete.confirm_open {
            return None;
        }
        let product = self.pending_delete.target.clone()?;

        let previous = self.items.clone();
        self.items.retain(|p| p.id != product.id);
        self.pending_delete.confirm_open = false;
        self.deletes_in_flight.insert(product.id);

        Some(DeleteTicket {
            product,
            previous,
            page_seq: self.page_seq,
        })
    }

    pub fn finish_delete(&mut self, ticket: DeleteTicket, result: Result<(), GatewayError>) {
        let id = ticket.product.id;
        self.deletes_in_flight.remove(&id);

        match result {
            Ok(()) => {
                info!(product_id = id.0, "product deleted");
                self.deleted.insert(id);
                self.pending_delete.clear_if_target(id);
            }
            Err(err) => {
                warn!(product_id = id.0, "delete failed, rolling back: {err}");
                self.items = if ticket.page_seq == self.page_seq {
                    self.without_removed(&ticket.previous)
                } else {
                    self.without_removed(&self.page)
                };
                self.banner = Some(DELETE_FAILED_MESSAGE.to_string());
                self.pending_delete.clear_if_target(id);
            }
        }
    }

    fn without_removed(&self, products: &[Product]) -> Vec<Product> {
        products
            .iter()
            .filter(|p| !self.deletes_in_flight.contains(&p.id) && !self.deleted.contains(&p.id))
            .cloned()
            .collect()
    }

    pub async fn refresh(&mut self) {
        let ticket = self.begin_fetch();
        self.run_fetch(ticket).await;
    }

    pub async fn next_page(&mut self) {
        if let Some(ticket) = self.advance() {
            self.run_fetch(ticket).await;
        }
    }

    pub async fn previous_page(&mut self) {
        if let Some(ticket) = self.retreat() {
            self.run_fetch(ticket).await;
        }
    }

    pub async fn retry(&mut self) {
        self.refresh().await;
    }

    pub async fn confirm_and_delete(&mut self) {
        let Some(ticket) = self.confirm_delete() else {
            return;
        };
        let result = self.gateway.delete(ticket.product_id()).await;
        self.finish_delete(ticket, result);
    }

    async fn run_fetch(&mut self, ticket: FetchTicket) {
        let result = self.gateway.list(ticket.limit, ticket.offset).await;
        self.apply_fetch(ticket, result);
    }

    pub async fn dispatch(&mut self, event: CatalogEvent) {
        match event {
            CatalogEvent::Mount | CatalogEvent::Retry => self.refresh().await,
            CatalogEvent::NextPage => self.next_page().await,
            CatalogEvent::PreviousPage => self.previous_page().await,
            CatalogEvent::Search(term) => self.set_search(term),
            CatalogEvent::RequestDelete(id) => {
                self.request_delete(id);
            }
            CatalogEvent::ConfirmDelete => self.confirm_and_delete().await,
            CatalogEvent::CancelDelete => self.cancel_delete(),
            CatalogEvent::DismissBanner => self.dismiss_banner(),
        }
    }
}

/// Case-insensitive substring match on title or category name.
pub fn filter_products<'a, I>(products: I, term: &str) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    let needle = term.to_lowercase();
    products
        .into_iter()
        .filter(|product| {
            needle.is_empty()
                || product.title.to_lowercase().contains(&needle)
                || product
                    .category_name()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
