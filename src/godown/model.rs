//! # Records and Drafts
//!
//! Two families of types live here:
//!
//! - **Records** ([`Location`], [`Item`], [`User`]) mirror what the server returns.
//!   Ids are server-assigned strings; on the wire they are called `_id`.
//! - **Drafts** ([`LocationDraft`], [`ItemDraft`]) hold raw user input exactly as typed.
//!   Validating a draft is the only way to obtain a request body ([`NewLocation`],
//!   [`NewItem`]), so nothing unvalidated ever reaches the network.
//!
//! Checks that need the Record Store (does the parent exist, is it a godown) live in
//! the command layer; drafts only check what can be known from the input itself.

use crate::error::{GodownError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_godown: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Location {
    /// A sub-location is any non-godown location; only these may hold items.
    pub fn is_sub_location(&self) -> bool {
        !self.is_godown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    InStock,
    OutOfStock,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::InStock => "in_stock",
            ItemStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = GodownError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "in_stock" => Ok(ItemStatus::InStock),
            "out_of_stock" => Ok(ItemStatus::OutOfStock),
            other => Err(GodownError::validation(format!(
                "Invalid status '{}': expected in_stock or out_of_stock",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: ItemStatus,
    pub sub_godown_id: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Body of `POST /locations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub is_godown: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Body of `POST /items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub quantity: u64,
    pub category: String,
    pub status: ItemStatus,
    pub sub_godown_id: String,
    pub price: f64,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Raw location form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDraft {
    pub name: String,
    pub is_godown: bool,
    pub parent_id: Option<String>,
}

impl LocationDraft {
    pub fn godown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_godown: true,
            parent_id: None,
        }
    }

    pub fn sub_location(name: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_godown: false,
            parent_id: Some(parent_id.into()),
        }
    }

    /// Checks the shape of the input. Whether the parent exists is checked by the caller.
    pub fn validate(&self) -> Result<NewLocation> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(GodownError::validation("Location name cannot be empty"));
        }

        let parent_id = self
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        match (self.is_godown, &parent_id) {
            (true, Some(_)) => Err(GodownError::validation(
                "A godown is a root location and cannot have a parent",
            )),
            (false, None) => Err(GodownError::validation(
                "A sub-location needs a parent godown",
            )),
            _ => Ok(NewLocation {
                name: name.to_string(),
                is_godown: self.is_godown,
                parent_id,
            }),
        }
    }
}

/// Raw item form input. Every field is kept as typed; empty means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub quantity: String,
    pub category: String,
    pub status: String,
    pub price: String,
    pub brand: String,
    pub attributes: String,
    pub image_url: String,
}

impl ItemDraft {
    /// Parses and checks every field, binding the item to `location_id`.
    ///
    /// The result still has to pass [`PendingItem::confirm`] before it can be sent.
    pub fn validate(&self, location_id: &str) -> Result<PendingItem> {
        let name = required(&self.name, "name")?;
        let quantity_text = required(&self.quantity, "quantity")?;
        let category = required(&self.category, "category")?;
        let price_text = required(&self.price, "price")?;
        let brand = required(&self.brand, "brand")?;

        let quantity: u64 = quantity_text.parse().map_err(|_| {
            GodownError::validation(format!(
                "Quantity must be a non-negative whole number, got '{}'",
                quantity_text
            ))
        })?;

        let price: f64 = price_text
            .parse()
            .ok()
            .filter(|p: &f64| p.is_finite() && *p >= 0.0)
            .ok_or_else(|| {
                GodownError::validation(format!(
                    "Price must be a non-negative number, got '{}'",
                    price_text
                ))
            })?;

        let status = if self.status.trim().is_empty() {
            ItemStatus::InStock
        } else {
            self.status.parse()?
        };

        let attributes = parse_attributes(&self.attributes)?;

        let image_url = Some(self.image_url.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Ok(PendingItem {
            item: NewItem {
                name,
                quantity,
                category,
                status,
                sub_godown_id: location_id.to_string(),
                price,
                brand,
                attributes,
                image_url,
            },
        })
    }
}

/// A validated item that may still need the user's go-ahead.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingItem {
    item: NewItem,
}

impl PendingItem {
    /// Out-of-stock items are stored with quantity 0; a non-zero quantity would be lost.
    pub fn needs_confirmation(&self) -> bool {
        self.item.status == ItemStatus::OutOfStock && self.item.quantity != 0
    }

    pub fn confirmation_prompt(&self) -> String {
        format!(
            "'{}' is set to out of stock. Proceed with quantity set to 0 (was {})?",
            self.item.name, self.item.quantity
        )
    }

    pub fn preview(&self) -> &NewItem {
        &self.item
    }

    /// Produces the request body. Quantity is only reset once `confirmed` is true.
    pub fn confirm(self, confirmed: bool) -> Result<NewItem> {
        if !self.needs_confirmation() {
            return Ok(self.item);
        }
        if !confirmed {
            return Err(GodownError::ConfirmationRequired(self.confirmation_prompt()));
        }
        let mut item = self.item;
        item.quantity = 0;
        Ok(item)
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GodownError::validation(format!(
            "Item {} is required",
            field
        )));
    }
    Ok(trimmed.to_string())
}

/// Attributes are free-form JSON typed by the user. Anything but an object is an error.
pub fn parse_attributes(text: &str) -> Result<Option<Map<String, Value>>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(GodownError::validation(
            "Attributes must be a JSON object, e.g. {\"color\": \"red\"}",
        )),
        Err(e) => Err(GodownError::validation(format!(
            "Attributes are not valid JSON: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ItemDraft {
        ItemDraft {
            name: "Drill".into(),
            quantity: "5".into(),
            category: "Tools".into(),
            status: "".into(),
            price: "49.90".into(),
            brand: "Bosch".into(),
            attributes: "".into(),
            image_url: "".into(),
        }
    }

    #[test]
    fn location_deserializes_wire_id() {
        let json = r#"{"_id":"g1","name":"Main","is_godown":true,"parent_id":null,"__v":0}"#;
        let loc: Location = serde_json::from_str(json).unwrap();
        assert_eq!(loc.id, "g1");
        assert!(loc.is_godown);
        assert_eq!(loc.parent_id, None);
    }

    #[test]
    fn location_accepts_plain_id_alias() {
        let json = r#"{"id":"l1","name":"Shelf","is_godown":false,"parent_id":"g1"}"#;
        let loc: Location = serde_json::from_str(json).unwrap();
        assert_eq!(loc.id, "l1");
        assert_eq!(loc.parent_id.as_deref(), Some("g1"));
    }

    #[test]
    fn new_item_omits_absent_optionals() {
        let item = draft().validate("l1").unwrap().confirm(false).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("attributes").is_none());
        assert!(json.get("image_url").is_none());
        assert_eq!(json["status"], "in_stock");
        assert_eq!(json["sub_godown_id"], "l1");
    }

    #[test]
    fn location_draft_requires_name() {
        let err = LocationDraft::godown("   ").validate().unwrap_err();
        assert!(matches!(err, GodownError::Validation(_)));
    }

    #[test]
    fn sub_location_requires_parent() {
        let draft = LocationDraft {
            name: "Shelf".into(),
            is_godown: false,
            parent_id: Some("  ".into()),
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn godown_rejects_parent() {
        let draft = LocationDraft {
            name: "Main".into(),
            is_godown: true,
            parent_id: Some("g0".into()),
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn item_draft_parses_fields() {
        let pending = draft().validate("l1").unwrap();
        let item = pending.preview();
        assert_eq!(item.quantity, 5);
        assert_eq!(item.price, 49.90);
        assert_eq!(item.status, ItemStatus::InStock);
    }

    #[test]
    fn item_draft_rejects_missing_brand() {
        let mut d = draft();
        d.brand = " ".into();
        let err = d.validate("l1").unwrap_err();
        assert!(err.to_string().contains("brand"));
    }

    #[test]
    fn item_draft_rejects_negative_quantity() {
        let mut d = draft();
        d.quantity = "-2".into();
        assert!(d.validate("l1").is_err());
    }

    #[test]
    fn item_draft_rejects_negative_price() {
        let mut d = draft();
        d.price = "-1".into();
        assert!(d.validate("l1").is_err());
    }

    #[test]
    fn item_draft_rejects_unknown_status() {
        let mut d = draft();
        d.status = "backordered".into();
        assert!(d.validate("l1").is_err());
    }

    #[test]
    fn invalid_attributes_fail() {
        let mut d = draft();
        d.attributes = "{color: red".into();
        let err = d.validate("l1").unwrap_err();
        assert!(matches!(err, GodownError::Validation(_)));
    }

    #[test]
    fn non_object_attributes_fail() {
        let mut d = draft();
        d.attributes = "[1, 2]".into();
        assert!(d.validate("l1").is_err());
    }

    #[test]
    fn attributes_object_is_kept() {
        let mut d = draft();
        d.attributes = r#"{"voltage": 18}"#.into();
        let item = d.validate("l1").unwrap().confirm(false).unwrap();
        assert_eq!(item.attributes.unwrap()["voltage"], 18);
    }

    #[test]
    fn out_of_stock_needs_confirmation_before_reset() {
        let mut d = draft();
        d.status = "out_of_stock".into();
        let pending = d.validate("l1").unwrap();
        assert!(pending.needs_confirmation());

        let err = pending.clone().confirm(false).unwrap_err();
        assert!(matches!(err, GodownError::ConfirmationRequired(_)));

        let item = pending.confirm(true).unwrap();
        assert_eq!(item.quantity, 0);
        assert_eq!(item.status, ItemStatus::OutOfStock);
    }

    #[test]
    fn out_of_stock_with_zero_quantity_needs_no_confirmation() {
        let mut d = draft();
        d.status = "out_of_stock".into();
        d.quantity = "0".into();
        let pending = d.validate("l1").unwrap();
        assert!(!pending.needs_confirmation());
        assert_eq!(pending.confirm(false).unwrap().quantity, 0);
    }
}
