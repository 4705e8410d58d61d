use crate::domain::model::{Dimension, ItemRecord};
use crate::domain::ports::FieldUpdateStrategy;
use crate::utils::error::{Result, UpdaterError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Remote attribute each CSV dimension column is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFields {
    #[serde(default = "default_length_field")]
    pub length: String,
    #[serde(default = "default_width_field")]
    pub width: String,
    #[serde(default = "default_height_field")]
    pub height: String,
    #[serde(default = "default_weight_field")]
    pub weight: String,
}

fn default_length_field() -> String {
    "SalesUnitLength1".to_string()
}

fn default_width_field() -> String {
    "SalesUnitWidth1".to_string()
}

fn default_height_field() -> String {
    "SalesUnitHeight1".to_string()
}

fn default_weight_field() -> String {
    "SalesUnitWeight1".to_string()
}

impl Default for DimensionFields {
    fn default() -> Self {
        Self {
            length: default_length_field(),
            width: default_width_field(),
            height: default_height_field(),
            weight: default_weight_field(),
        }
    }
}

impl DimensionFields {
    pub fn field_for(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Length => &self.length,
            Dimension::Width => &self.width,
            Dimension::Height => &self.height,
            Dimension::Weight => &self.weight,
        }
    }
}

/// Writes every non-blank dimension column as a decimal.
#[derive(Debug, Clone, Default)]
pub struct DimensionStrategy {
    fields: DimensionFields,
}

impl DimensionStrategy {
    pub fn new(fields: DimensionFields) -> Self {
        Self { fields }
    }
}

impl FieldUpdateStrategy for DimensionStrategy {
    fn assignments(&self, item: &ItemRecord) -> Result<Vec<(String, Value)>> {
        let mut assignments = Vec::new();

        for dimension in Dimension::ALL {
            let Some(raw) = item.dimension(dimension) else {
                continue;
            };
            let value = parse_decimal(dimension.name(), raw)?;
            assignments.push((self.fields.field_for(dimension).to_string(), value));
        }

        Ok(assignments)
    }
}

fn parse_decimal(column: &str, raw: &str) -> Result<Value> {
    let invalid = |reason: String| UpdaterError::InvalidFieldValue {
        field: column.to_string(),
        value: raw.to_string(),
        reason,
    };

    let parsed: f64 = raw.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
    serde_json::Number::from_f64(parsed)
        .map(Value::Number)
        .ok_or_else(|| invalid("value is not a finite number".to_string()))
}

/// Sets a fixed group of fields on every record, ignoring the CSV columns.
#[derive(Debug, Clone)]
pub struct FlagStrategy {
    fields: BTreeMap<String, Value>,
}

impl FlagStrategy {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FieldUpdateStrategy for FlagStrategy {
    fn assignments(&self, _item: &ItemRecord) -> Result<Vec<(String, Value)>> {
        Ok(self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(length: Option<&str>, weight: Option<&str>) -> ItemRecord {
        ItemRecord {
            length: length.map(str::to_string),
            weight: weight.map(str::to_string),
            ..ItemRecord::new("A100")
        }
    }

    #[test]
    fn test_dimensions_skip_blank_columns() {
        let strategy = DimensionStrategy::default();

        let assignments = strategy.assignments(&item(Some("10"), Some("1.25"))).unwrap();

        assert_eq!(
            assignments,
            vec![
                ("SalesUnitLength1".to_string(), json!(10.0)),
                ("SalesUnitWeight1".to_string(), json!(1.25)),
            ]
        );
    }

    #[test]
    fn test_dimensions_with_no_columns_change_nothing() {
        let strategy = DimensionStrategy::default();
        assert!(strategy.assignments(&item(None, None)).unwrap().is_empty());
    }

    #[test]
    fn test_dimensions_use_custom_mapping() {
        let strategy = DimensionStrategy::new(DimensionFields {
            length: "U_Length".to_string(),
            ..DimensionFields::default()
        });

        let assignments = strategy.assignments(&item(Some("3"), None)).unwrap();
        assert_eq!(assignments[0].0, "U_Length");
    }

    #[test]
    fn test_dimensions_reject_non_numeric_value() {
        let strategy = DimensionStrategy::default();

        let err = strategy.assignments(&item(Some("ten"), None)).unwrap_err();

        assert!(matches!(err, UpdaterError::InvalidFieldValue { ref field, .. } if field == "length"));
        assert!(err.to_string().contains("ten"));
    }

    #[test]
    fn test_dimensions_reject_infinite_value() {
        let strategy = DimensionStrategy::default();
        assert!(strategy.assignments(&item(None, Some("inf"))).is_err());
    }

    #[test]
    fn test_flags_ignore_columns() {
        let mut fields = BTreeMap::new();
        fields.insert("U_ShowOnWeb".to_string(), json!("Y"));
        fields.insert("U_WebSync".to_string(), json!("Y"));
        let strategy = FlagStrategy::new(fields);

        let assignments = strategy.assignments(&item(Some("ten"), None)).unwrap();

        assert_eq!(
            assignments,
            vec![
                ("U_ShowOnWeb".to_string(), json!("Y")),
                ("U_WebSync".to_string(), json!("Y")),
            ]
        );
    }
}
