//! Invoice search by customer name, with page-window semantics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fatura_core::{CustomerId, DomainError};
use fatura_infra::{CustomerStore, InvoiceStore};

use crate::error::EngineResult;
use crate::views::InvoiceView;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: 10,
        }
    }
}

impl PageRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.page_number < 1 {
            return Err(DomainError::validation("pageNumber must be at least 1"));
        }
        if self.page_size < 1 {
            return Err(DomainError::validation("pageSize must be at least 1"));
        }
        Ok(())
    }
}

/// One page of results plus the window bookkeeping the caller paginates by.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub total_pages: u32,
    pub page_number: u32,
    pub page_size: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self::window(Vec::new(), request)
    }

    /// Slice a full result set into the requested window. A page past the
    /// end yields empty items with the true counts.
    pub fn window(all: Vec<T>, request: PageRequest) -> Self {
        let total_count = all.len();
        let page_size = request.page_size.max(1);
        let total_pages = (total_count as u32).div_ceil(page_size);

        let offset = (request.page_number as usize - 1) * page_size as usize;
        let items: Vec<T> = all
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Self {
            items,
            total_count,
            total_pages,
            page_number: request.page_number,
            page_size,
            has_previous_page: request.page_number > 1,
            has_next_page: request.page_number < total_pages,
        }
    }
}

/// A matched invoice plus the customer name it matched on.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceHit {
    pub customer_name: String,
    #[serde(flatten)]
    pub invoice: InvoiceView,
}

#[derive(Clone)]
pub struct InvoiceSearch {
    invoices: Arc<dyn InvoiceStore>,
    customers: Arc<dyn CustomerStore>,
}

impl InvoiceSearch {
    pub fn new(invoices: Arc<dyn InvoiceStore>, customers: Arc<dyn CustomerStore>) -> Self {
        Self { invoices, customers }
    }

    /// Case-insensitive substring match on the invoice's customer name.
    ///
    /// A blank query is an empty result, not "everything". Customer names
    /// are looked up read-through per run; nothing is cached across calls.
    pub async fn by_customer_name(
        &self,
        query: &str,
        request: PageRequest,
        today: NaiveDate,
    ) -> EngineResult<Page<InvoiceHit>> {
        request.validate()?;

        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Page::empty(request));
        }

        let invoices = self.invoices.list().await?;
        let mut names: HashMap<CustomerId, Option<String>> = HashMap::new();
        let mut hits = Vec::new();

        for invoice in &invoices {
            let customer_id = invoice.customer_id();
            let name = match names.entry(customer_id) {
                std::collections::hash_map::Entry::Occupied(entry) => entry.get().clone(),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let name = self
                        .customers
                        .get(customer_id)
                        .await?
                        .map(|customer| customer.full_name());
                    entry.insert(name.clone());
                    name
                }
            };

            let Some(name) = name else {
                // Dangling customer reference (settled invoices survive a
                // customer delete); unmatchable by name.
                continue;
            };
            if name.to_lowercase().contains(&needle) {
                hits.push(InvoiceHit {
                    customer_name: name,
                    invoice: InvoiceView::of(invoice, today),
                });
            }
        }

        Ok(Page::window(hits, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fatura_billing::{Invoice, InvoiceDraft, LineItemDraft, RenewalCycle};
    use fatura_core::{InvoiceId, ServiceId};
    use fatura_customers::{Customer, CustomerDraft};
    use fatura_infra::InMemoryStore;
    use rust_decimal::Decimal;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn page(number: u32, size: u32) -> PageRequest {
        PageRequest {
            page_number: number,
            page_size: size,
        }
    }

    async fn seed_customer(store: &InMemoryStore, first: &str, last: &str) -> CustomerId {
        let customer = Customer::new(
            CustomerId::new(),
            CustomerDraft {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: format!("{first}.{last}@example.com").to_lowercase(),
                phone: None,
                tax_office: None,
                tax_number: None,
                address: None,
                description: None,
            },
            Utc::now(),
        )
        .unwrap();
        CustomerStore::insert(store, &customer).await.unwrap();
        customer.id_typed()
    }

    async fn seed_invoices(store: &InMemoryStore, customer_id: CustomerId, count: usize) {
        for _ in 0..count {
            let invoice = Invoice::new(
                InvoiceId::new(),
                InvoiceDraft {
                    customer_id,
                    description: None,
                    items: vec![LineItemDraft {
                        id: None,
                        service_id: ServiceId::new(),
                        renewal_cycle: RenewalCycle::Monthly,
                        price: Decimal::from(10),
                        quantity: 1,
                        vat: Decimal::ZERO,
                        start_date: day(2024, 1, 1),
                        due_date: None,
                        description: None,
                    }],
                },
                Utc::now(),
            )
            .unwrap();
            InvoiceStore::insert(store, &invoice).await.unwrap();
        }
    }

    async fn fixture() -> (Arc<InMemoryStore>, InvoiceSearch) {
        let store = Arc::new(InMemoryStore::new());
        let search = InvoiceSearch::new(store.clone(), store.clone());
        (store, search)
    }

    #[tokio::test]
    async fn blank_query_returns_an_empty_page() {
        let (store, search) = fixture().await;
        let acme = seed_customer(&store, "Acme", "Ltd").await;
        seed_invoices(&store, acme, 2).await;

        for query in ["", "   "] {
            let result = search
                .by_customer_name(query, page(1, 10), day(2024, 1, 1))
                .await
                .unwrap();
            assert!(result.items.is_empty());
            assert_eq!(result.total_count, 0);
        }
    }

    #[tokio::test]
    async fn match_is_case_insensitive_substring_on_full_name() {
        let (store, search) = fixture().await;
        let acme = seed_customer(&store, "Acme", "Holding").await;
        let other = seed_customer(&store, "Globex", "AŞ").await;
        seed_invoices(&store, acme, 2).await;
        seed_invoices(&store, other, 1).await;

        let result = search
            .by_customer_name("acme", page(1, 10), day(2024, 1, 1))
            .await
            .unwrap();
        assert_eq!(result.total_count, 2);
        assert!(result
            .items
            .iter()
            .all(|hit| hit.customer_name == "Acme Holding"));

        // Substring across the first/last boundary also matches.
        let result = search
            .by_customer_name("e hold", page(1, 10), day(2024, 1, 1))
            .await
            .unwrap();
        assert_eq!(result.total_count, 2);
    }

    #[tokio::test]
    async fn page_windows_carry_the_full_counts() {
        let (store, search) = fixture().await;
        let acme = seed_customer(&store, "Acme", "Ltd").await;
        seed_invoices(&store, acme, 5).await;

        let first = search
            .by_customer_name("Acme", page(1, 2), day(2024, 1, 1))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_count, 5);
        assert_eq!(first.total_pages, 3);
        assert!(!first.has_previous_page);
        assert!(first.has_next_page);

        let last = search
            .by_customer_name("Acme", page(3, 2), day(2024, 1, 1))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(last.has_previous_page);
        assert!(!last.has_next_page);
    }

    #[tokio::test]
    async fn page_beyond_the_end_is_empty_with_true_counts() {
        let (store, search) = fixture().await;
        let acme = seed_customer(&store, "Acme", "Ltd").await;
        seed_invoices(&store, acme, 3).await;

        let result = search
            .by_customer_name("Acme", page(99, 10), day(2024, 1, 1))
            .await
            .unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_count, 3);
        assert_eq!(result.total_pages, 1);
        assert!(result.has_previous_page);
        assert!(!result.has_next_page);
    }

    #[tokio::test]
    async fn invalid_page_params_are_validation_errors() {
        let (_, search) = fixture().await;
        for request in [page(0, 10), page(1, 0)] {
            let err = search
                .by_customer_name("Acme", request, day(2024, 1, 1))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                crate::error::EngineError::Domain(DomainError::Validation(_))
            ));
        }
    }
}
