//! Document-level helpers shared by the record store backends.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::StoreError;
use crate::item::{InventoryItem, ItemFields};
use crate::records::WriteMode;

/// Raw document body, as a hosted document store would hold it.
pub type Document = Map<String, Value>;

#[derive(Deserialize)]
struct StoredFields {
    // Documents written by a bare photo merge have no quantity yet.
    #[serde(default)]
    quantity: u32,
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

/// Apply a write to the document slot for one key.
pub fn apply(
    slot: Option<&mut Document>,
    fields: ItemFields,
    mode: WriteMode,
) -> Result<Option<Document>, StoreError> {
    let incoming = match serde_json::to_value(fields)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    match (slot, mode) {
        (Some(existing), WriteMode::Merge) => {
            existing.extend(incoming);
            Ok(None)
        }
        (Some(existing), WriteMode::Overwrite) => {
            *existing = incoming;
            Ok(None)
        }
        (None, _) => Ok(Some(incoming)),
    }
}

/// Decode one document into an item.
pub fn decode(name: &str, document: &Document) -> Result<InventoryItem, serde_json::Error> {
    let fields: StoredFields = serde_json::from_value(Value::Object(document.clone()))?;
    Ok(InventoryItem {
        name: name.to_string(),
        quantity: fields.quantity,
        image_url: fields.image_url,
    })
}

/// Decode the document stored under `name`, if there is one.
///
/// A document that doesn't fit the item shape is an error here, not a miss: callers use
/// lookups to decide whether a name is free.
pub fn lookup(
    name: &str,
    document: Option<&Document>,
) -> Result<Option<InventoryItem>, StoreError> {
    document
        .map(|document| {
            decode(name, document).map_err(|e| StoreError::Malformed {
                name: name.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

/// Decode a whole collection, skipping documents that don't fit the item shape.
pub fn decode_all<'a>(
    documents: impl IntoIterator<Item = (&'a String, &'a Document)>,
) -> Vec<InventoryItem> {
    documents
        .into_iter()
        .filter_map(|(name, document)| match decode(name, document) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(item.name = %name, error = %e, "skipping malformed inventory document");
                None
            }
        })
        .collect()
}
