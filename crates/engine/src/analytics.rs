//! Reporting queries: dashboard counters and customer/service analysis.
//!
//! Spending, revenue, and popularity aggregate **paid** invoices only, which
//! makes the active/passive split exactly "has at least one invoice that
//! reached Paid". All figures are read-through; nothing is precomputed or
//! cached.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use fatura_billing::{Invoice, InvoiceStatus};
use fatura_core::{CustomerId, DomainError, ServiceId};
use fatura_infra::{CustomerStore, InvoiceStore, ServiceStore};

use crate::error::EngineResult;
use crate::views::InvoiceView;

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_customers: usize,
    pub total_invoices: usize,
    pub total_services: usize,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub stats: DashboardStats,
    pub upcoming_invoices: Vec<InvoiceView>,
    pub overdue_invoices: Vec<InvoiceView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_customers: usize,
    pub total_revenue: Decimal,
    pub average_spending_per_customer: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUsage {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub total_spent: Decimal,
    pub total_services_used: usize,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePopularity {
    pub service_id: ServiceId,
    pub service_name: String,
    pub customer_count: usize,
    pub total_revenue: Decimal,
    pub average_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAnalysisReport {
    pub summary: AnalysisSummary,
    pub customer_usages: Vec<CustomerUsage>,
    pub service_popularity: Vec<ServicePopularity>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUsage {
    pub service_id: ServiceId,
    pub service_name: String,
    pub usage_count: usize,
    pub total_amount: Decimal,
    pub last_used_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerServiceUsage {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub total_spent: Decimal,
    pub total_services_used: usize,
    pub service_usages: Vec<ServiceUsage>,
}

/// Number of invoices shown in each dashboard list.
const DASHBOARD_LIST_LIMIT: usize = 5;

#[derive(Clone)]
pub struct Analytics {
    customers: Arc<dyn CustomerStore>,
    services: Arc<dyn ServiceStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl Analytics {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        services: Arc<dyn ServiceStore>,
        invoices: Arc<dyn InvoiceStore>,
    ) -> Self {
        Self {
            customers,
            services,
            invoices,
        }
    }

    pub async fn dashboard(&self, today: NaiveDate) -> EngineResult<DashboardSummary> {
        let customers = self.customers.list().await?;
        let services = self.services.list().await?;
        let invoices = self.invoices.list().await?;

        let total_revenue = paid_total(&invoices)?;

        let mut upcoming: Vec<InvoiceView> = invoices
            .iter()
            .map(|invoice| InvoiceView::of(invoice, today))
            .filter(|view| {
                view.status == InvoiceStatus::Pending && view.due_date.is_some_and(|due| due >= today)
            })
            .collect();
        upcoming.sort_by_key(|view| view.due_date);
        upcoming.truncate(DASHBOARD_LIST_LIMIT);

        let mut overdue: Vec<InvoiceView> = invoices
            .iter()
            .map(|invoice| InvoiceView::of(invoice, today))
            .filter(|view| view.status == InvoiceStatus::Overdue)
            .collect();
        overdue.sort_by_key(|view| view.due_date);
        overdue.truncate(DASHBOARD_LIST_LIMIT);

        Ok(DashboardSummary {
            stats: DashboardStats {
                total_customers: customers.len(),
                total_invoices: invoices.len(),
                total_services: services.len(),
                total_revenue,
            },
            upcoming_invoices: upcoming,
            overdue_invoices: overdue,
        })
    }

    pub async fn service_analysis(&self) -> EngineResult<ServiceAnalysisReport> {
        let customers = self.customers.list().await?;
        let invoices = self.invoices.list().await?;

        let total_revenue = paid_total(&invoices)?;
        let average = if customers.is_empty() {
            Decimal::ZERO
        } else {
            total_revenue / Decimal::from(customers.len() as u64)
        };

        let mut customer_usages = Vec::with_capacity(customers.len());
        for customer in &customers {
            let paid: Vec<&Invoice> = invoices
                .iter()
                .filter(|invoice| {
                    invoice.customer_id() == customer.id_typed()
                        && invoice.status() == InvoiceStatus::Paid
                })
                .collect();

            let mut total_spent = Decimal::ZERO;
            let mut services_used: HashSet<ServiceId> = HashSet::new();
            for invoice in &paid {
                total_spent += invoice.total_amount();
                services_used.extend(invoice.items().iter().map(|item| item.service_id()));
            }

            customer_usages.push(CustomerUsage {
                customer_id: customer.id_typed(),
                customer_name: customer.full_name(),
                total_spent,
                total_services_used: services_used.len(),
                is_active: !paid.is_empty(),
            });
        }

        let service_popularity = self.popularity(&invoices).await?;

        Ok(ServiceAnalysisReport {
            summary: AnalysisSummary {
                total_customers: customers.len(),
                total_revenue,
                average_spending_per_customer: average,
            },
            customer_usages,
            service_popularity,
        })
    }

    /// Per-service aggregates over paid invoices, biggest earner first.
    async fn popularity(&self, invoices: &[Invoice]) -> EngineResult<Vec<ServicePopularity>> {
        struct Bucket {
            customers: HashSet<CustomerId>,
            revenue: Decimal,
            uses: usize,
        }

        let mut buckets: BTreeMap<ServiceId, Bucket> = BTreeMap::new();
        for invoice in invoices {
            if invoice.status() != InvoiceStatus::Paid {
                continue;
            }
            for item in invoice.items() {
                let bucket = buckets.entry(item.service_id()).or_insert_with(|| Bucket {
                    customers: HashSet::new(),
                    revenue: Decimal::ZERO,
                    uses: 0,
                });
                bucket.customers.insert(invoice.customer_id());
                bucket.revenue += item.subtotal()?;
                bucket.uses += 1;
            }
        }

        let mut popularity = Vec::with_capacity(buckets.len());
        for (service_id, bucket) in buckets {
            let service_name = match self.services.get(service_id).await? {
                Some(service) => service.name().to_string(),
                // No delete guard for services; historical items may dangle.
                None => "(removed service)".to_string(),
            };
            let average_price = if bucket.uses == 0 {
                Decimal::ZERO
            } else {
                bucket.revenue / Decimal::from(bucket.uses as u64)
            };
            popularity.push(ServicePopularity {
                service_id,
                service_name,
                customer_count: bucket.customers.len(),
                total_revenue: bucket.revenue,
                average_price,
            });
        }

        popularity.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
        Ok(popularity)
    }

    /// Per-customer breakdown of which services they paid for.
    pub async fn customer_usage(&self, id: CustomerId) -> EngineResult<CustomerServiceUsage> {
        let customer = self
            .customers
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {id} does not exist")))?;

        let invoices = self.invoices.list_by_customer(id).await?;

        struct Bucket {
            uses: usize,
            amount: Decimal,
            last_used: Option<DateTime<Utc>>,
        }

        let mut total_spent = Decimal::ZERO;
        let mut buckets: BTreeMap<ServiceId, Bucket> = BTreeMap::new();
        for invoice in &invoices {
            if invoice.status() != InvoiceStatus::Paid {
                continue;
            }
            total_spent += invoice.total_amount();
            for item in invoice.items() {
                let bucket = buckets.entry(item.service_id()).or_insert_with(|| Bucket {
                    uses: 0,
                    amount: Decimal::ZERO,
                    last_used: None,
                });
                bucket.uses += 1;
                bucket.amount += item.subtotal()?;
                bucket.last_used = bucket.last_used.max(Some(invoice.created_at()));
            }
        }

        let mut service_usages = Vec::with_capacity(buckets.len());
        for (service_id, bucket) in buckets {
            let service_name = match self.services.get(service_id).await? {
                Some(service) => service.name().to_string(),
                None => "(removed service)".to_string(),
            };
            service_usages.push(ServiceUsage {
                service_id,
                service_name,
                usage_count: bucket.uses,
                total_amount: bucket.amount,
                last_used_date: bucket.last_used,
            });
        }
        service_usages.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));

        Ok(CustomerServiceUsage {
            customer_id: customer.id_typed(),
            customer_name: customer.full_name(),
            total_spent,
            total_services_used: service_usages.len(),
            service_usages,
        })
    }

    /// Customer usages, optionally narrowed to customers who paid for one
    /// specific service.
    pub async fn usage_by_customer(
        &self,
        service_id: Option<ServiceId>,
    ) -> EngineResult<Vec<CustomerUsage>> {
        let report = self.service_analysis().await?;
        let Some(service_id) = service_id else {
            return Ok(report.customer_usages);
        };

        let invoices = self.invoices.list().await?;
        let users: HashSet<CustomerId> = invoices
            .iter()
            .filter(|invoice| invoice.status() == InvoiceStatus::Paid)
            .filter(|invoice| {
                invoice
                    .items()
                    .iter()
                    .any(|item| item.service_id() == service_id)
            })
            .map(|invoice| invoice.customer_id())
            .collect();

        Ok(report
            .customer_usages
            .into_iter()
            .filter(|usage| users.contains(&usage.customer_id))
            .collect())
    }
}

fn paid_total(invoices: &[Invoice]) -> EngineResult<Decimal> {
    let mut total = Decimal::ZERO;
    for invoice in invoices {
        if invoice.status() == InvoiceStatus::Paid {
            total = total
                .checked_add(invoice.total_amount())
                .ok_or_else(|| DomainError::validation("revenue total overflow"))?;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fatura_billing::{InvoiceDraft, LineItemDraft, RenewalCycle};
    use fatura_catalog::{Service, ServiceDraft};
    use fatura_core::InvoiceId;
    use fatura_customers::{Customer, CustomerDraft};
    use fatura_infra::InMemoryStore;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seed_customer(store: &InMemoryStore, first: &str) -> CustomerId {
        let customer = Customer::new(
            CustomerId::new(),
            CustomerDraft {
                first_name: first.to_string(),
                last_name: "Test".to_string(),
                email: format!("{first}@example.com").to_lowercase(),
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

    async fn seed_service(store: &InMemoryStore, name: &str, price: i64) -> ServiceId {
        let service = Service::new(
            ServiceId::new(),
            ServiceDraft {
                name: name.to_string(),
                price: Decimal::from(price),
            },
            Utc::now(),
        )
        .unwrap();
        ServiceStore::insert(store, &service).await.unwrap();
        service.id_typed()
    }

    /// Invoice with one zero-VAT item priced `price`, optionally paid.
    async fn seed_invoice(
        store: &InMemoryStore,
        customer_id: CustomerId,
        service_id: ServiceId,
        price: i64,
        paid: bool,
    ) {
        let mut invoice = Invoice::new(
            InvoiceId::new(),
            InvoiceDraft {
                customer_id,
                description: None,
                items: vec![LineItemDraft {
                    id: None,
                    service_id,
                    renewal_cycle: RenewalCycle::Monthly,
                    price: Decimal::from(price),
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
        if paid {
            invoice.mark_paid().unwrap();
        }
        InvoiceStore::insert(store, &invoice).await.unwrap();
    }

    fn analytics(store: &Arc<InMemoryStore>) -> Analytics {
        Analytics::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn revenue_counts_paid_invoices_only() {
        let store = Arc::new(InMemoryStore::new());
        let customer = seed_customer(&store, "Rev").await;
        let service = seed_service(&store, "Hosting", 100).await;
        seed_invoice(&store, customer, service, 100, true).await;
        seed_invoice(&store, customer, service, 999, false).await;

        let dashboard = analytics(&store).dashboard(day(2024, 1, 1)).await.unwrap();
        assert_eq!(dashboard.stats.total_revenue, Decimal::from(100));
        assert_eq!(dashboard.stats.total_invoices, 2);
        assert_eq!(dashboard.stats.total_customers, 1);
        assert_eq!(dashboard.stats.total_services, 1);
    }

    #[tokio::test]
    async fn customers_split_into_active_and_passive_by_paid_invoices() {
        let store = Arc::new(InMemoryStore::new());
        let active = seed_customer(&store, "Active").await;
        let passive = seed_customer(&store, "Passive").await;
        let none = seed_customer(&store, "Idle").await;
        let service = seed_service(&store, "Hosting", 100).await;

        seed_invoice(&store, active, service, 100, true).await;
        // Pending only: still passive.
        seed_invoice(&store, passive, service, 100, false).await;

        let report = analytics(&store).service_analysis().await.unwrap();
        let by_id = |id: CustomerId| {
            report
                .customer_usages
                .iter()
                .find(|usage| usage.customer_id == id)
                .unwrap()
        };

        assert!(by_id(active).is_active);
        assert_eq!(by_id(active).total_spent, Decimal::from(100));
        assert!(!by_id(passive).is_active);
        assert_eq!(by_id(passive).total_spent, Decimal::ZERO);
        assert!(!by_id(none).is_active);
    }

    #[tokio::test]
    async fn popularity_groups_paid_items_by_service() {
        let store = Arc::new(InMemoryStore::new());
        let a = seed_customer(&store, "Alpha").await;
        let b = seed_customer(&store, "Beta").await;
        let hosting = seed_service(&store, "Hosting", 100).await;
        let backup = seed_service(&store, "Backup", 50).await;

        seed_invoice(&store, a, hosting, 100, true).await;
        seed_invoice(&store, b, hosting, 200, true).await;
        seed_invoice(&store, a, backup, 50, true).await;

        let report = analytics(&store).service_analysis().await.unwrap();
        assert_eq!(report.service_popularity.len(), 2);

        // Biggest earner first.
        let top = &report.service_popularity[0];
        assert_eq!(top.service_id, hosting);
        assert_eq!(top.customer_count, 2);
        assert_eq!(top.total_revenue, Decimal::from(300));
        assert_eq!(top.average_price, Decimal::from(150));

        assert_eq!(report.summary.total_revenue, Decimal::from(350));
        assert_eq!(
            report.summary.average_spending_per_customer,
            Decimal::from(175)
        );
    }

    #[tokio::test]
    async fn customer_usage_breaks_down_paid_services() {
        let store = Arc::new(InMemoryStore::new());
        let customer = seed_customer(&store, "Detail").await;
        let hosting = seed_service(&store, "Hosting", 100).await;

        seed_invoice(&store, customer, hosting, 100, true).await;
        seed_invoice(&store, customer, hosting, 100, true).await;
        seed_invoice(&store, customer, hosting, 100, false).await;

        let usage = analytics(&store).customer_usage(customer).await.unwrap();
        assert_eq!(usage.total_spent, Decimal::from(200));
        assert_eq!(usage.total_services_used, 1);
        assert_eq!(usage.service_usages.len(), 1);
        assert_eq!(usage.service_usages[0].usage_count, 2);
        assert_eq!(usage.service_usages[0].total_amount, Decimal::from(200));
        assert!(usage.service_usages[0].last_used_date.is_some());
    }

    #[tokio::test]
    async fn usage_by_customer_filters_to_users_of_a_service() {
        let store = Arc::new(InMemoryStore::new());
        let a = seed_customer(&store, "Uses").await;
        let b = seed_customer(&store, "Skips").await;
        let hosting = seed_service(&store, "Hosting", 100).await;
        let backup = seed_service(&store, "Backup", 50).await;

        seed_invoice(&store, a, hosting, 100, true).await;
        seed_invoice(&store, b, backup, 50, true).await;

        let filtered = analytics(&store)
            .usage_by_customer(Some(hosting))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].customer_id, a);

        let unfiltered = analytics(&store).usage_by_customer(None).await.unwrap();
        assert_eq!(unfiltered.len(), 2);
    }
}
