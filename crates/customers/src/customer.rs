use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use fatura_core::{CustomerId, DomainError, DomainResult, Entity};

/// Incoming customer fields, as submitted on create/update.
///
/// Validated by [`CustomerDraft::validate`] before any entity is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tax_office: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CustomerDraft {
    /// Field-shape validation: name parts non-empty, email well-formed.
    pub fn validate(&self) -> DomainResult<()> {
        if self.first_name.trim().is_empty() {
            return Err(DomainError::validation("first name must not be empty"));
        }
        if self.last_name.trim().is_empty() {
            return Err(DomainError::validation("last name must not be empty"));
        }
        if !self.email.validate_email() {
            return Err(DomainError::validation(format!(
                "invalid email address: {:?}",
                self.email
            )));
        }
        Ok(())
    }
}

/// Entity: Customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    id: CustomerId,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    tax_office: Option<String>,
    tax_number: Option<String>,
    address: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Customer {
    /// Build a customer from a validated draft.
    pub fn new(id: CustomerId, draft: CustomerDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            phone: draft.phone,
            tax_office: draft.tax_office,
            tax_number: draft.tax_number,
            address: draft.address,
            description: draft.description,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace mutable fields from a validated draft. Identity and
    /// `created_at` are preserved.
    pub fn apply(&mut self, draft: CustomerDraft, now: DateTime<Utc>) -> DomainResult<()> {
        draft.validate()?;
        self.first_name = draft.first_name;
        self.last_name = draft.last_name;
        self.email = draft.email;
        self.phone = draft.phone;
        self.tax_office = draft.tax_office;
        self.tax_number = draft.tax_number;
        self.address = draft.address;
        self.description = draft.description;
        self.updated_at = now;
        Ok(())
    }

    /// Rehydrate a customer from stored fields (no validation; the store only
    /// holds records that already passed it).
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: CustomerId,
        first_name: String,
        last_name: String,
        email: String,
        phone: Option<String>,
        tax_office: Option<String>,
        tax_number: Option<String>,
        address: Option<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            email,
            phone,
            tax_office,
            tax_number,
            address,
            description,
            created_at,
            updated_at,
        }
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Rendered name, as displayed and as matched by invoice search.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn tax_office(&self) -> Option<&str> {
        self.tax_office.as_deref()
    }

    pub fn tax_number(&self) -> Option<&str> {
        self.tax_number.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> CustomerDraft {
        CustomerDraft {
            first_name: "Ayşe".to_string(),
            last_name: "Yılmaz".to_string(),
            email: "ayse@example.com".to_string(),
            phone: Some("+90 555 000 0000".to_string()),
            tax_office: None,
            tax_number: None,
            address: None,
            description: None,
        }
    }

    #[test]
    fn valid_draft_builds_customer() {
        let customer = Customer::new(CustomerId::new(), draft(), Utc::now()).unwrap();
        assert_eq!(customer.full_name(), "Ayşe Yılmaz");
        assert_eq!(customer.email(), "ayse@example.com");
    }

    #[test]
    fn rejects_blank_name_parts() {
        let mut d = draft();
        d.first_name = "   ".to_string();
        let err = Customer::new(CustomerId::new(), d, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let mut d = draft();
        d.last_name = String::new();
        let err = Customer::new(CustomerId::new(), d, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_email() {
        for bad in ["", "not-an-email", "a@", "@b.com", "a b@c.com"] {
            let mut d = draft();
            d.email = bad.to_string();
            let err = Customer::new(CustomerId::new(), d, Utc::now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{bad:?}");
        }
    }

    #[test]
    fn apply_replaces_fields_and_keeps_identity() {
        let id = CustomerId::new();
        let created = Utc::now();
        let mut customer = Customer::new(id, draft(), created).unwrap();

        let mut d = draft();
        d.last_name = "Demir".to_string();
        d.phone = None;
        customer.apply(d, Utc::now()).unwrap();

        assert_eq!(customer.id_typed(), id);
        assert_eq!(customer.created_at(), created);
        assert_eq!(customer.full_name(), "Ayşe Demir");
        assert_eq!(customer.phone(), None);
    }

    #[test]
    fn apply_rejects_invalid_draft_without_mutating() {
        let mut customer = Customer::new(CustomerId::new(), draft(), Utc::now()).unwrap();
        let mut d = draft();
        d.email = "broken".to_string();
        assert!(customer.apply(d, Utc::now()).is_err());
        assert_eq!(customer.email(), "ayse@example.com");
    }
}
