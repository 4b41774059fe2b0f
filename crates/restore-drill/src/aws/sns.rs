//! SNS notification delivery

use crate::aws::context::{AwsContext, FromAwsContext};
use anyhow::{Context, Result};
use aws_sdk_sns::{Client, types::MessageAttributeValue};
use tracing::debug;

/// SNS client for drill notifications
pub struct SnsNotifier {
    client: Client,
}

impl FromAwsContext for SnsNotifier {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.sns_client(),
        }
    }
}

impl SnsNotifier {
    /// Publish a plain-text message with string message attributes.
    pub async fn publish(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
        attributes: &[(String, String)],
    ) -> Result<()> {
        let mut request = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .subject(subject)
            .message(message);

        for (name, value) in attributes {
            let attribute = MessageAttributeValue::builder()
                .data_type("String")
                .string_value(value)
                .build()
                .with_context(|| format!("Invalid message attribute '{name}'"))?;
            request = request.message_attributes(name, attribute);
        }

        let response = request.send().await.context("Failed to publish notification")?;
        debug!(message_id = ?response.message_id(), "Notification published");

        Ok(())
    }
}
