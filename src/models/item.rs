use crate::utils::constants::{PARTITION_KEY, SORT_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed attribute value ready for the key-value table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Composite primary key: `"{city}, {country}"` + `"{lat},{lon}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub city_country: String,
    pub coordinates: String,
}

impl ItemKey {
    pub fn new(city: &str, country: &str, lat: &str, lon: &str) -> Self {
        Self {
            city_country: format!("{}, {}", city, country),
            coordinates: format!("{},{}", lat, lon),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} | {})", self.city_country, self.coordinates)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableItem {
    pub key: ItemKey,
    pub attributes: BTreeMap<String, FieldValue>,
}

impl TableItem {
    pub fn new(key: ItemKey) -> Self {
        Self {
            key,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.attributes.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.attributes.get(name)
    }

    /// Total attribute count including both key attributes
    pub fn field_count(&self) -> usize {
        self.attributes.len() + 2
    }

    /// Key attributes first, then the remaining attributes by name
    pub fn fields(&self) -> Vec<(&str, String)> {
        let mut fields = Vec::with_capacity(self.field_count());
        fields.push((PARTITION_KEY, self.key.city_country.clone()));
        fields.push((SORT_KEY, self.key.coordinates.clone()));
        fields.extend(
            self.attributes
                .iter()
                .map(|(name, value)| (name.as_str(), value.to_string())),
        );
        fields
    }
}
