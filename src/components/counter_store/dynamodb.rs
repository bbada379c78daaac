use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;

use std::collections::HashMap;
use std::time::Duration;

use crate::configuration::DynamoDbSettings;
use crate::domain::counter::CounterKey;

use super::{CounterStore, CounterStoreError};

const COUNT_PLACEHOLDER: &str = "#count";
const DELTA_PLACEHOLDER: &str = ":incr";

/// Counter kept as a number attribute of a DynamoDB item.
///
/// `increment` is a single `UpdateItem` with an `ADD` expression, which DynamoDB applies
/// atomically and which treats a missing item or attribute as zero.
#[derive(Debug, Clone)]
pub struct DynamoDbCounterStore {
    client: Client,
    table_name: String,
    partition_key: String,
    count_attribute: String,
}

impl DynamoDbCounterStore {
    pub fn new(client: Client, settings: &DynamoDbSettings) -> Self {
        Self {
            client,
            table_name: settings.table_name.clone(),
            partition_key: settings.partition_key.clone(),
            count_attribute: settings.count_attribute.clone(),
        }
    }

    /// Build a client from the ambient AWS credential chain, pinned to the configured region.
    #[tracing::instrument(name = "Connecting DynamoDB counter store", skip(settings))]
    pub async fn connect(settings: &DynamoDbSettings, timeout: Duration) -> Self {
        let loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());

        // DynamoDB Local / LocalStack
        let loader = match &settings.endpoint_url {
            Some(endpoint) => loader.endpoint_url(endpoint),
            None => loader,
        };

        let sdk_config = loader.load().await;
        tracing::info!(
            region = %settings.region,
            table = %settings.table_name,
            "DynamoDB client ready"
        );

        Self::new(Client::new(&sdk_config), settings)
    }

    fn key_attribute(&self, key: &CounterKey) -> (String, AttributeValue) {
        (
            self.partition_key.clone(),
            AttributeValue::S(key.to_string()),
        )
    }
}

#[async_trait]
impl CounterStore for DynamoDbCounterStore {
    async fn get(&self, key: &CounterKey) -> Result<Option<i64>, CounterStoreError> {
        let (key_name, key_value) = self.key_attribute(key);

        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        tracing::debug!(?output, "GetItem answered");

        let Some(item) = output.item() else {
            return Ok(None);
        };

        // Present item without the attribute yet: `ADD` would start it from zero.
        Ok(Some(read_count(key, item, &self.count_attribute)?.unwrap_or(0)))
    }

    async fn increment(&self, key: &CounterKey, delta: i64) -> Result<i64, CounterStoreError> {
        let (key_name, key_value) = self.key_attribute(key);

        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .update_expression(format!("ADD {COUNT_PLACEHOLDER} {DELTA_PLACEHOLDER}"))
            .expression_attribute_names(COUNT_PLACEHOLDER, &self.count_attribute)
            .expression_attribute_values(DELTA_PLACEHOLDER, AttributeValue::N(delta.to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        output
            .attributes()
            .map(|attributes| read_count(key, attributes, &self.count_attribute))
            .transpose()?
            .flatten()
            .ok_or_else(|| {
                CounterStoreError::Backend(format!(
                    "UpdateItem on `{key}` returned no `{}` attribute",
                    self.count_attribute
                ))
            })
    }
}

/// Connectivity problems (no response at all) are `Unavailable`, everything the service
/// answered with or that failed before dispatch is `Backend`.
fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> CounterStoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            CounterStoreError::Unavailable(detail)
        }
        _ => CounterStoreError::Backend(detail),
    }
}

fn read_count(
    key: &CounterKey,
    item: &HashMap<String, AttributeValue>,
    count_attribute: &str,
) -> Result<Option<i64>, CounterStoreError> {
    let Some(value) = item.get(count_attribute) else {
        return Ok(None);
    };

    let malformed = |detail: String| CounterStoreError::Malformed {
        key: key.to_string(),
        detail,
    };

    let number = value
        .as_n()
        .map_err(|other| malformed(format!("expected a number attribute, found {other:?}")))?;

    number
        .parse::<i64>()
        .map(Some)
        .map_err(|e| malformed(format!("`{number}` is not a 64-bit integer: {e}")))
}
