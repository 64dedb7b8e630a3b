//! Customers table.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use yousuf_rice_core::models::{Customer, NewCustomer};
use yousuf_rice_core::{CustomerId, PhoneNumber};

use super::to_attributes;
use crate::error::{BackendError, Result};
use crate::store::{Collection, Document, DocumentStore, ListQuery};

const COLLECTION: Collection = Collection::Customers;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CustomerRecord {
    name: String,
    phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    address: String,
    area: String,
    city: String,
}

fn to_customer(doc: &Document) -> Result<Customer> {
    let record: CustomerRecord = doc.decode(COLLECTION)?;
    let phone = PhoneNumber::parse(&record.phone).map_err(|e| BackendError::Decode {
        collection: COLLECTION,
        id: doc.id.clone(),
        message: e.to_string(),
    })?;
    Ok(Customer {
        id: CustomerId::new(doc.id.clone()),
        name: record.name,
        phone,
        email: record.email,
        address: record.address,
        area: record.area,
        city: record.city,
        created_at: doc.created_at,
    })
}

#[derive(Clone)]
pub struct CustomerRepository {
    store: Arc<dyn DocumentStore>,
}

impl CustomerRepository {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Look a customer up by canonical phone number.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails.
    #[instrument(skip(self, phone))]
    pub async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Customer>> {
        let docs = self
            .store
            .list(
                COLLECTION,
                &ListQuery::new().equal("phone", phone.as_str()).limit(1),
            )
            .await?;
        docs.first().map(to_customer).transpose()
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the write fails.
    #[instrument(skip(self, customer))]
    pub async fn create(&self, customer: &NewCustomer) -> Result<Customer> {
        let record = CustomerRecord {
            name: customer.name.clone(),
            phone: customer.phone.as_str().to_owned(),
            email: customer.email.clone(),
            address: customer.address.clone(),
            area: customer.area.clone(),
            city: customer.city.clone(),
        };
        let doc = self
            .store
            .create(COLLECTION, to_attributes(COLLECTION, &record)?)
            .await?;
        to_customer(&doc)
    }
}
