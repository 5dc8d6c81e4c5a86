use crate::error::ValidationError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Authorization role attached to a user record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full console access.
    Admin,
    /// Regular account. New registrations always start here.
    #[default]
    User,
}

/// A record type that can be synchronized against one store resource path.
///
/// Implementors declare where they live ([`Resource::PATH`]), how the
/// projection orders them ([`Resource::sort_key`]), and what must hold
/// before a write leaves the process ([`Resource::validate`]).
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The resource path in the remote store (e.g. `"users"`).
    const PATH: &'static str;

    /// Ordering key for the projected list. Records with a missing or
    /// empty key sort first.
    fn sort_key(&self) -> &str;

    /// Checks the record before any store call.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A user of the admin console.
///
/// `auth_uid` links the record to an identity-provider account; it is how
/// the session binder resolves a signed-in identity to its profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub auth_uid: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Resource for UserRecord {
    const PATH: &'static str = "users";

    fn sort_key(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                resource: Self::PATH,
                field: "email",
            });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                resource: Self::PATH,
                field: "name",
            });
        }
        Ok(())
    }
}

/// A product in the inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl Resource for ProductRecord {
    const PATH: &'static str = "products";

    fn sort_key(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                resource: Self::PATH,
                field: "name",
            });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                resource: Self::PATH,
                field: "description",
            });
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(ValidationError::InvalidNumber {
                resource: Self::PATH,
                field: "price",
                value: self.price,
            });
        }
        Ok(())
    }
}

/// A record with its store key reattached.
///
/// The key is the store path segment, never part of the stored field set.
/// Serialization flattens the fields next to an `id` member, which is the
/// shape consumers of a projection see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyed<R> {
    /// The store-generated key (stable for the record's lifetime).
    #[serde(rename = "id")]
    pub key: String,
    /// The record's stored fields.
    #[serde(flatten)]
    pub fields: R,
}

impl<R> Keyed<R> {
    /// Attaches a key to a record.
    pub fn new(key: impl Into<String>, fields: R) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }
}
