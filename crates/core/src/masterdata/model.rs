//! Master-data bundle and assignment models.

use serde::{Deserialize, Serialize};

/// The full lookup-table bundle (response types, property types, road
/// types, ...). Refreshed wholesale on login; table contents are opaque to
/// the store and keyed by their server-side names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterDataBundle {
    #[serde(flatten)]
    pub tables: serde_json::Map<String, serde_json::Value>,
}

impl MasterDataBundle {
    /// Lookup array by name; empty slice when the table is absent or not
    /// an array (consumers render an empty dropdown).
    pub fn table(&self, name: &str) -> &[serde_json::Value] {
        self.tables
            .get(name)
            .and_then(|value| value.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// A resolved administrative unit reference (ULB, zone, ward or mohalla).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRef {
    pub id: String,
    pub name: String,
}

/// One ward/mohalla scope assigned to the surveyor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub ulb: UnitRef,
    pub zone: UnitRef,
    pub ward: UnitRef,
    #[serde(default)]
    pub mohallas: Vec<UnitRef>,
}

impl Assignment {
    /// Seed the location section of a new survey from this assignment.
    /// Existing values are overwritten; the surveyor picks the mohalla on
    /// the form, so only the list's scope is implied here.
    pub fn prefill(&self, location_details: &mut serde_json::Value) {
        if !location_details.is_object() {
            *location_details = serde_json::json!({});
        }
        let map = location_details.as_object_mut().expect("object ensured");
        map.insert("ulbId".to_string(), self.ulb.id.clone().into());
        map.insert("ulbName".to_string(), self.ulb.name.clone().into());
        map.insert("zoneId".to_string(), self.zone.id.clone().into());
        map.insert("zoneName".to_string(), self.zone.name.clone().into());
        map.insert("wardId".to_string(), self.ward.id.clone().into());
        map.insert("wardName".to_string(), self.ward.name.clone().into());
    }
}
