use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ItemError;

pub const DEFAULT_WISHLIST_NAME: &str = "New Wishlist";
pub const FIRST_WISHLIST_NAME: &str = "My First Wishlist";

/// A single entry on a wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    id: Uuid,
    name: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub notes: String,
    date_added: DateTime<Utc>,
}

impl WishlistItem {
    /// Builds an item with a fresh id stamped with the current time.
    ///
    /// Blank names are rejected so an empty name never reaches the durable file.
    pub fn new(
        name: impl Into<String>,
        link: impl Into<String>,
        notes: impl Into<String>,
    ) -> Result<Self, ItemError> {
        let name = validated_name(name.into())?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            link: link.into(),
            notes: notes.into(),
            date_added: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ItemError> {
        self.name = validated_name(name.into())?;
        Ok(())
    }

    pub fn date_added(&self) -> DateTime<Utc> {
        self.date_added
    }
}

fn validated_name(name: String) -> Result<String, ItemError> {
    if name.trim().is_empty() {
        return Err(ItemError::BlankName);
    }
    Ok(name)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    id: Uuid,
    pub name: String,
    #[serde(default)]
    pub items: Vec<WishlistItem>,
    #[serde(
        default,
        with = "cover_image",
        skip_serializing_if = "Option::is_none"
    )]
    cover_image_data: Option<Arc<[u8]>>,
    #[serde(default, deserialize_with = "lenient_offset")]
    cover_image_offset_x: f64,
    #[serde(default, deserialize_with = "lenient_offset")]
    cover_image_offset_y: f64,
    date_created: DateTime<Utc>,
}

impl Wishlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            items: Vec::new(),
            cover_image_data: None,
            cover_image_offset_x: 0.0,
            cover_image_offset_y: 0.0,
            date_created: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    pub fn cover_image(&self) -> Option<&[u8]> {
        self.cover_image_data.as_deref()
    }

    /// Replaces the cover image. Removing the image also resets its offset.
    pub fn set_cover_image(&mut self, data: Option<Vec<u8>>) {
        if data.is_none() {
            self.cover_image_offset_x = 0.0;
            self.cover_image_offset_y = 0.0;
        }
        self.cover_image_data = data.map(Arc::from);
    }

    /// Focal-point displacement of the cover image as `(x, y)`.
    pub fn cover_offset(&self) -> (f64, f64) {
        (self.cover_image_offset_x, self.cover_image_offset_y)
    }

    /// Non-finite components are stored as `0.0`; JSON cannot carry them.
    pub fn set_cover_offset(&mut self, x: f64, y: f64) {
        self.cover_image_offset_x = finite_or_zero(x);
        self.cover_image_offset_y = finite_or_zero(y);
    }

    pub fn item(&self, item_id: Uuid) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn summary(&self) -> WishlistSummary {
        WishlistSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl Default for Wishlist {
    fn default() -> Self {
        Self::new(DEFAULT_WISHLIST_NAME)
    }
}

/// Listing shape handed to external clients: never carries items or images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistSummary {
    pub id: Uuid,
    pub name: String,
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Reads `null` or a non-numeric offset as `0.0` instead of failing the record.
fn lenient_offset<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().map(finite_or_zero).unwrap_or(0.0))
}

mod cover_image {
    use std::sync::Arc;

    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &Option<Arc<[u8]>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match data {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Arc<[u8]>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = Option::<String>::deserialize(deserializer)?;
        encoded
            .map(|value| {
                STANDARD
                    .decode(value.trim())
                    .map(Arc::from)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
