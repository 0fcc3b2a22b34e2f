//! Address service.

use sea_orm::Set;
use serde::Deserialize;
use tienda_common::{AppError, AppResult, IdGenerator};
use tienda_db::{entities::address, repositories::AddressRepository};
use validator::Validate;

/// Address service for business logic.
#[derive(Clone)]
pub struct AddressService {
    address_repo: AddressRepository,
    id_gen: IdGenerator,
}

/// Input for creating an address.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAddressInput {
    #[validate(length(min = 1, max = 64))]
    pub address_name: String,

    #[validate(length(min = 1, max = 256))]
    pub address_line1: String,

    #[validate(length(max = 256))]
    pub address_line2: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub city: String,

    #[validate(length(min = 1, max = 128))]
    pub state: String,

    #[validate(length(min = 1, max = 128))]
    pub country: String,

    #[validate(length(min = 1, max = 16))]
    pub zipcode: String,
}

/// Input for updating an address.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAddressInput {
    #[validate(length(min = 1, max = 64))]
    pub address_name: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub address_line1: Option<String>,

    #[validate(length(max = 256))]
    pub address_line2: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub city: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub state: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub country: Option<String>,

    #[validate(length(min = 1, max = 16))]
    pub zipcode: Option<String>,
}

impl AddressService {
    /// Create a new address service.
    #[must_use]
    pub fn new(address_repo: AddressRepository) -> Self {
        Self {
            address_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an address. The newest address becomes the default, so existing
    /// defaults are cleared first.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreateAddressInput,
    ) -> AppResult<address::Model> {
        input.validate()?;

        if self
            .address_repo
            .find_by_name(user_id, &input.address_name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "An address named '{}' already exists",
                input.address_name
            )));
        }

        self.address_repo.clear_defaults(user_id).await?;

        let model = address::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            address_name: Set(input.address_name),
            address_line1: Set(input.address_line1),
            address_line2: Set(input.address_line2),
            city: Set(input.city),
            state: Set(input.state),
            country: Set(input.country),
            zipcode: Set(input.zipcode),
            is_default: Set(true),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        self.address_repo.create(model).await
    }

    /// Get one of the caller's addresses.
    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<address::Model> {
        let address = self.address_repo.get_by_id(id).await?;
        if address.user_id != user_id {
            return Err(AppError::Forbidden(
                "Address belongs to another user".to_string(),
            ));
        }
        Ok(address)
    }

    /// List the caller's addresses.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<address::Model>> {
        self.address_repo.find_by_user(user_id).await
    }

    /// Update one of the caller's addresses.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        input: UpdateAddressInput,
    ) -> AppResult<address::Model> {
        input.validate()?;

        let address = self.get(user_id, id).await?;

        if let Some(new_name) = &input.address_name {
            if new_name != &address.address_name
                && self
                    .address_repo
                    .find_by_name(user_id, new_name)
                    .await?
                    .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "An address named '{new_name}' already exists"
                )));
            }
        }

        let mut active: address::ActiveModel = address.into();

        if let Some(address_name) = input.address_name {
            active.address_name = Set(address_name);
        }
        if let Some(address_line1) = input.address_line1 {
            active.address_line1 = Set(address_line1);
        }
        if let Some(address_line2) = input.address_line2 {
            active.address_line2 = Set(Some(address_line2));
        }
        if let Some(city) = input.city {
            active.city = Set(city);
        }
        if let Some(state) = input.state {
            active.state = Set(state);
        }
        if let Some(country) = input.country {
            active.country = Set(country);
        }
        if let Some(zipcode) = input.zipcode {
            active.zipcode = Set(zipcode);
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.address_repo.update(active).await
    }

    /// Make one of the caller's addresses the default. Clears every other
    /// default first so at most one remains.
    pub async fn set_default(&self, user_id: &str, id: &str) -> AppResult<address::Model> {
        let address = self.get(user_id, id).await?;
        self.address_repo.clear_defaults(user_id).await?;
        self.address_repo.set_default(address).await
    }

    /// Delete one of the caller's addresses. The default address cannot be
    /// deleted; pick another default first.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let address = self.get(user_id, id).await?;

        if address.is_default {
            return Err(AppError::Conflict(
                "The default address cannot be deleted".to_string(),
            ));
        }

        self.address_repo.delete(address).await
    }
}
