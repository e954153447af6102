//! Property values and their static metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reactive::Observable;

/// Read/write access declared for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Ro,
    Rw,
}

/// Static metadata for a property, fetched once as part of a device's
/// interface and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub desc: Option<String>,
    pub dtype: String,
    pub access: Access,
    #[serde(default)]
    pub units: Option<String>,
}

/// The runtime value of a property plus its numeric/enum constraints.
///
/// Invariant: if `options` is set, `value` must be one of them; if `min`/
/// `max` are set and `value` is numeric, it lies in `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyModelData {
    pub value: Value,
    #[serde(default, rename = "min_val")]
    pub min: Option<f64>,
    #[serde(default, rename = "max_val")]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub options: Option<Vec<Value>>,
}

impl PropertyModelData {
    /// `true` if `value` satisfies the `options`/`min`/`max` constraints
    /// currently set on this model. A property with no constraints always
    /// satisfies them.
    pub fn is_consistent(&self) -> bool {
        if let Some(options) = &self.options {
            if !options.contains(&self.value) {
                return false;
            }
        }
        if let Some(n) = self.value.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    return false;
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return false;
                }
            }
        }
        true
    }
}

/// The reactive handle a UI binds to. Cloning shares state; updates mutate
/// the shared cell in place so the reference stays identity-stable across
/// updates, per the catalog's stability invariant.
pub type PropertyModel = Observable<PropertyModelData>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_constraint_is_checked() {
        let model = PropertyModelData {
            value: serde_json::json!("fast"),
            min: None,
            max: None,
            step: None,
            options: Some(vec![serde_json::json!("slow"), serde_json::json!("fast")]),
        };
        assert!(model.is_consistent());

        let bad = PropertyModelData {
            value: serde_json::json!("turbo"),
            ..model
        };
        assert!(!bad.is_consistent());
    }

    #[test]
    fn numeric_range_constraint_is_checked() {
        let model = PropertyModelData {
            value: serde_json::json!(12.5),
            min: Some(0.0),
            max: Some(100.0),
            step: None,
            options: None,
        };
        assert!(model.is_consistent());

        let out_of_range = PropertyModelData {
            value: serde_json::json!(150.0),
            ..model
        };
        assert!(!out_of_range.is_consistent());
    }

    #[test]
    fn wire_field_names_match_s6() {
        let parsed: PropertyModelData =
            serde_json::from_str(r#"{"value":12.5,"min_val":0,"max_val":100}"#).unwrap();
        assert_eq!(parsed.value, serde_json::json!(12.5));
        assert_eq!(parsed.min, Some(0.0));
        assert_eq!(parsed.max, Some(100.0));
    }
}
