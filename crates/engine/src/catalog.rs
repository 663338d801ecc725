//! Service catalog operations.
//!
//! No delete guard exists for services: removing one that historical line
//! items still reference is allowed, and later renewal of such an invoice
//! fails its reference check as a per-invoice batch outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use fatura_catalog::{Service, ServiceDraft};
use fatura_core::{DomainError, ServiceId};
use fatura_infra::ServiceStore;

use crate::error::EngineResult;
use crate::rules;

#[derive(Clone)]
pub struct CatalogService {
    services: Arc<dyn ServiceStore>,
}

impl CatalogService {
    pub fn new(services: Arc<dyn ServiceStore>) -> Self {
        Self { services }
    }

    pub async fn create(&self, draft: ServiceDraft, now: DateTime<Utc>) -> EngineResult<Service> {
        draft.validate()?;
        rules::ensure_service_name_unique(self.services.as_ref(), &draft.name, None).await?;

        let service = Service::new(ServiceId::new(), draft, now)?;
        self.services.insert(&service).await?;
        Ok(service)
    }

    pub async fn update(
        &self,
        id: ServiceId,
        draft: ServiceDraft,
        now: DateTime<Utc>,
    ) -> EngineResult<Service> {
        let mut service = self
            .services
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("service {id} does not exist")))?;

        draft.validate()?;
        rules::ensure_service_name_unique(self.services.as_ref(), &draft.name, Some(id)).await?;

        service.apply(draft, now)?;
        self.services.update(&service).await?;
        Ok(service)
    }

    pub async fn delete(&self, id: ServiceId) -> EngineResult<()> {
        if !self.services.delete(id).await? {
            return Err(DomainError::not_found(format!("service {id} does not exist")).into());
        }
        Ok(())
    }

    pub async fn get(&self, id: ServiceId) -> EngineResult<Service> {
        self.services
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("service {id} does not exist")).into())
    }

    pub async fn list(&self) -> EngineResult<Vec<Service>> {
        Ok(self.services.list().await?)
    }

    /// Unit-price lookup used to prefill line items.
    pub async fn price_of(&self, id: ServiceId) -> EngineResult<Decimal> {
        Ok(self.get(id).await?.price())
    }
}
