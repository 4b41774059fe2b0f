//! CloudWatch metrics publishing

use crate::aws::context::{AwsContext, FromAwsContext};
use anyhow::{Context, Result};
use aws_sdk_cloudwatch::{
    Client,
    types::{Dimension, MetricDatum, StandardUnit},
};
use tracing::debug;

/// One metric value to publish
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: &'static str,
    pub value: f64,
}

impl MetricSample {
    pub fn new(name: &'static str, value: f64) -> Self {
        Self { name, value }
    }

    /// A counter increment of one
    pub fn count(name: &'static str) -> Self {
        Self::new(name, 1.0)
    }
}

/// CloudWatch client for pushing drill metrics
pub struct CloudWatchMetrics {
    client: Client,
}

impl FromAwsContext for CloudWatchMetrics {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudwatch_client(),
        }
    }
}

impl CloudWatchMetrics {
    /// Publish samples in a single `PutMetricData` call, all sharing `dimensions`.
    pub async fn put_metrics(
        &self,
        namespace: &str,
        dimensions: &[(&str, &str)],
        samples: &[MetricSample],
    ) -> Result<()> {
        let dimensions: Vec<Dimension> = dimensions
            .iter()
            .map(|(name, value)| Dimension::builder().name(*name).value(*value).build())
            .collect();

        let data: Vec<MetricDatum> = samples
            .iter()
            .map(|sample| {
                MetricDatum::builder()
                    .metric_name(sample.name)
                    .set_dimensions(Some(dimensions.clone()))
                    .value(sample.value)
                    .unit(StandardUnit::Count)
                    .build()
            })
            .collect();

        debug!(namespace = %namespace, count = data.len(), "Pushing metrics");

        self.client
            .put_metric_data()
            .namespace(namespace)
            .set_metric_data(Some(data))
            .send()
            .await
            .context("Failed to put metric data")?;

        Ok(())
    }
}
