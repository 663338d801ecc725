use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fatura_core::{DomainError, DomainResult, Entity, ServiceId};

/// Incoming service fields, as submitted on create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    pub name: String,
    pub price: Decimal,
}

impl ServiceDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("service name must not be empty"));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "service price must not be negative (got {})",
                self.price
            )));
        }
        Ok(())
    }
}

/// Entity: a billable service with a unit price in its native billing unit.
///
/// Name uniqueness is dataset-wide and enforced by the engine against the
/// store, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    id: ServiceId,
    name: String,
    price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Service {
    pub fn new(id: ServiceId, draft: ServiceDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            name: draft.name,
            price: draft.price,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, draft: ServiceDraft, now: DateTime<Utc>) -> DomainResult<()> {
        draft.validate()?;
        self.name = draft.name;
        self.price = draft.price;
        self.updated_at = now;
        Ok(())
    }

    /// Rehydrate from stored fields (already validated when written).
    pub fn from_stored(
        id: ServiceId,
        name: String,
        price: Decimal,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            price,
            created_at,
            updated_at,
        }
    }

    pub fn id_typed(&self) -> ServiceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Service {
    type Id = ServiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
