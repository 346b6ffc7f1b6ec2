//! Inventory items and the document fields stored for them.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Smallest quantity a submit will accept.
pub const MIN_SUBMIT_QUANTITY: i64 = 1;

/// One inventory entry. `name` is the document id in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: u32,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Name with its first character upper-cased, for list rendering only.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Fields written to a document. `None` means "not part of this write":
/// a merge leaves that field as it is, an overwrite drops it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ItemFields {
    pub fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, url: Option<String>) -> Self {
        self.image_url = url;
        self
    }
}

/// Check a submission at the boundary and return the trimmed key and quantity.
pub fn validate_submission(name: &str, quantity: i64) -> Result<(String, u32), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if quantity < MIN_SUBMIT_QUANTITY {
        return Err(ValidationError::QuantityTooLow {
            min: MIN_SUBMIT_QUANTITY,
            got: quantity,
        });
    }
    let quantity = u32::try_from(quantity).map_err(|_| ValidationError::QuantityTooHigh(quantity))?;
    Ok((name.to_string(), quantity))
}
