use super::aws::service_error;
use super::table_store::{KeySchema, TableStatus, TableStore};
use crate::error::{Result, UploadError};
use crate::models::{FieldValue, ItemKey, TableItem};
use crate::utils::constants::{PARTITION_KEY, SORT_KEY};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType, PutRequest,
    ScalarAttributeType, Select, TableStatus as SdkTableStatus, WriteRequest,
};
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use tracing::{debug, warn};

/// [`TableStore`] backed by Amazon DynamoDB.
pub struct DynamoTableStore {
    client: Client,
}

impl DynamoTableStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl TableStore for DynamoTableStore {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut start: Option<String> = None;

        loop {
            let output = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(|e| service_error("ListTables", &e))?;

            names.extend(output.table_names().iter().cloned());

            match output.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => break,
            }
        }

        Ok(names)
    }

    async fn create_table(&self, table: &str, schema: &KeySchema) -> Result<()> {
        let result = self
            .client
            .create_table()
            .table_name(table)
            .key_schema(key_element(&schema.partition_key, KeyType::Hash)?)
            .key_schema(key_element(&schema.sort_key, KeyType::Range)?)
            .attribute_definitions(string_attribute(&schema.partition_key)?)
            .attribute_definitions(string_attribute(&schema.sort_key)?)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                // Another writer created it between our existence check and now
                let in_use = err
                    .as_service_error()
                    .map(|e| e.is_resource_in_use_exception())
                    .unwrap_or(false);
                if in_use {
                    warn!("Table {} was created concurrently", table);
                    Ok(())
                } else {
                    Err(service_error("CreateTable", &err))
                }
            }
        }
    }

    async fn table_status(&self, table: &str) -> Result<TableStatus> {
        let output = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| service_error("DescribeTable", &e))?;

        let status = output
            .table()
            .and_then(|t| t.table_status())
            .map(|s| match s {
                SdkTableStatus::Active => TableStatus::Active,
                SdkTableStatus::Creating => TableStatus::Creating,
                SdkTableStatus::Updating => TableStatus::Updating,
                SdkTableStatus::Deleting => TableStatus::Deleting,
                other => TableStatus::Other(other.as_str().to_string()),
            })
            .unwrap_or_else(|| TableStatus::Other("UNKNOWN".to_string()));

        Ok(status)
    }

    async fn batch_write(&self, table: &str, items: &[TableItem]) -> Result<Vec<ItemKey>> {
        let requests = items
            .iter()
            .map(|item| {
                let put = PutRequest::builder()
                    .set_item(Some(to_attribute_map(item)))
                    .build()
                    .map_err(|e| UploadError::Service(format!("Invalid put request: {}", e)))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table, requests)
            .send()
            .await
            .map_err(|e| service_error("BatchWriteItem", &e))?;

        let unprocessed: Vec<ItemKey> = output
            .unprocessed_items()
            .and_then(|tables| tables.get(table))
            .map(|requests| {
                requests
                    .iter()
                    .filter_map(|r| r.put_request())
                    .filter_map(|put| key_from_attributes(put.item()))
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "BatchWriteItem on {}: {} sent, {} unprocessed",
            table,
            items.len(),
            unprocessed.len()
        );
        Ok(unprocessed)
    }

    async fn count_items(&self, table: &str) -> Result<u64> {
        let mut total = 0u64;
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(table)
                .select(Select::Count)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| service_error("Scan", &e))?;

            total += u64::try_from(output.count()).unwrap_or(0);

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(total)
    }

    async fn sample_item(&self, table: &str) -> Result<Option<TableItem>> {
        let output = self
            .client
            .scan()
            .table_name(table)
            .limit(1)
            .send()
            .await
            .map_err(|e| service_error("Scan", &e))?;

        Ok(output.items().first().and_then(from_attribute_map))
    }
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| UploadError::provisioning(format!("key schema for {}", name), e.to_string()))
}

fn string_attribute(name: &str) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| {
            UploadError::provisioning(format!("attribute definition for {}", name), e.to_string())
        })
}

pub fn to_attribute_map(item: &TableItem) -> HashMap<String, AttributeValue> {
    let mut map = HashMap::with_capacity(item.field_count());
    map.insert(
        PARTITION_KEY.to_string(),
        AttributeValue::S(item.key.city_country.clone()),
    );
    map.insert(
        SORT_KEY.to_string(),
        AttributeValue::S(item.key.coordinates.clone()),
    );

    for (name, value) in &item.attributes {
        let attribute = match value {
            FieldValue::Integer(i) => AttributeValue::N(i.to_string()),
            FieldValue::Number(n) => AttributeValue::N(n.to_string()),
            FieldValue::Text(s) => AttributeValue::S(s.clone()),
        };
        map.insert(name.clone(), attribute);
    }

    map
}

fn key_from_attributes(map: &HashMap<String, AttributeValue>) -> Option<ItemKey> {
    let city_country = map.get(PARTITION_KEY)?.as_s().ok()?.clone();
    let coordinates = map.get(SORT_KEY)?.as_s().ok()?.clone();
    Some(ItemKey {
        city_country,
        coordinates,
    })
}

pub fn from_attribute_map(map: &HashMap<String, AttributeValue>) -> Option<TableItem> {
    let mut item = TableItem::new(key_from_attributes(map)?);

    for (name, value) in map {
        if name == PARTITION_KEY || name == SORT_KEY {
            continue;
        }
        let field = match value {
            AttributeValue::N(n) => match n.parse::<i64>() {
                Ok(i) => FieldValue::Integer(i),
                Err(_) => n
                    .parse::<f64>()
                    .map(FieldValue::Number)
                    .unwrap_or_else(|_| FieldValue::Text(n.clone())),
            },
            AttributeValue::S(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(format!("{:?}", other)),
        };
        item.insert(name.clone(), field);
    }

    Some(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> TableItem {
        TableItem::new(ItemKey::new("Cairo", "Egypt", "30.04", "31.24"))
            .with_attribute("avg_annual_temp", FieldValue::Number(22.1))
            .with_attribute("data_years", FieldValue::Integer(30))
            .with_attribute("climate_type", FieldValue::Text("Desert".to_string()))
    }

    #[test]
    fn test_attribute_types() {
        let map = to_attribute_map(&sample());

        assert_eq!(map.len(), 5);
        assert_eq!(map["city_country"], AttributeValue::S("Cairo, Egypt".to_string()));
        assert_eq!(map["coordinates"], AttributeValue::S("30.04,31.24".to_string()));
        assert_eq!(map["avg_annual_temp"], AttributeValue::N("22.1".to_string()));
        assert_eq!(map["data_years"], AttributeValue::N("30".to_string()));
        assert_eq!(map["climate_type"], AttributeValue::S("Desert".to_string()));
    }

    #[test]
    fn test_zero_decimal_is_numeric() {
        let item = TableItem::new(ItemKey::new("Lima", "Peru", "-12.05", "-77.04"))
            .with_attribute("summer_precipitation", FieldValue::Number(0.0));
        let map = to_attribute_map(&item);

        assert_eq!(map["summer_precipitation"], AttributeValue::N("0".to_string()));
    }

    #[test]
    fn test_scanned_item_conversion() {
        let item = from_attribute_map(&to_attribute_map(&sample())).unwrap();

        assert_eq!(item.key, sample().key);
        assert_eq!(item.get("data_years"), Some(&FieldValue::Integer(30)));
        assert_eq!(item.get("avg_annual_temp"), Some(&FieldValue::Number(22.1)));
    }

    #[test]
    fn test_item_without_key_is_ignored() {
        let mut map = HashMap::new();
        map.insert("city_country".to_string(), AttributeValue::S("Cairo, Egypt".to_string()));

        assert!(from_attribute_map(&map).is_none());
    }
}
