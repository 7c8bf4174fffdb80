//! Analytics queries over the BFF's GraphQL route, plus the chart
//! reshaping the dashboards draw from.

pub mod chart;
pub mod queries;

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::MissedTickBehavior;

use super::cache::{QueryCache, QueryKey, QueryOptions};
use super::error::{ClientError, ClientResult};
use super::graphql::GraphQlClient;
use crate::models::{
    AnalyticsFilterInput, AnalyticsHealth, AnalyticsReport, HistoricalMeasurements, HistoricalQueryInput,
    LatestMeasurementStatus, MultiMetricReport, MultiMetricReportInput, TrendAnalysis, TrendAnalysisInput,
};

pub use chart::{
    ChartPoint, CurrentReadings, PlantChart, RealtimeSnapshot, SeriesPoint, TrendSeries, TrendSummary,
    AIR_HUMIDITY, LIGHT_INTENSITY, PLANT_METRICS, SOIL_HUMIDITY, TEMPERATURE,
};

const SUPPORTED_METRICS_STALE: Duration = Duration::from_secs(5 * 60);
const HEALTH_STALE: Duration = Duration::from_secs(30);
const REPORT_STALE: Duration = Duration::from_secs(2 * 60);
const TREND_STALE: Duration = Duration::from_secs(5 * 60);
const HISTORICAL_STALE: Duration = Duration::from_secs(2 * 60);

pub const HEALTH_POLL: Duration = Duration::from_secs(60);
pub const LATEST_POLL: Duration = Duration::from_secs(3);
const REALTIME_WINDOW_HOURS: i64 = 1;

pub mod keys {
    use super::QueryKey;
    use crate::models::AnalyticsFilterInput;

    pub const ROOT: &str = "analytics";
    pub const GRAPHQL_ROOT: &str = "graphql";

    fn filters_segment(filters: Option<&AnalyticsFilterInput>) -> Option<String> {
        filters.and_then(|filters| serde_json::to_string(filters).ok())
    }

    fn sorted_joined(items: &[String]) -> String {
        let mut items = items.to_vec();
        items.sort();
        items.join(",")
    }

    pub fn supported_metrics() -> QueryKey {
        QueryKey::from([ROOT, "supported-metrics"])
    }

    pub fn health() -> QueryKey {
        QueryKey::from([ROOT, "health"])
    }

    pub fn single_metric(metric_name: &str, controller_id: &str, filters: Option<&AnalyticsFilterInput>) -> QueryKey {
        let mut segments = vec![
            ROOT.to_string(),
            "single-metric".to_string(),
            metric_name.to_string(),
            controller_id.to_string(),
        ];
        segments.extend(filters_segment(filters));
        QueryKey::new(segments)
    }

    /// Controllers and metrics are sorted so the key ignores their order.
    pub fn multi_metric(controllers: &[String], metrics: &[String], filters: Option<&AnalyticsFilterInput>) -> QueryKey {
        let mut segments = vec![
            ROOT.to_string(),
            "multi-metric".to_string(),
            sorted_joined(controllers),
            sorted_joined(metrics),
        ];
        segments.extend(filters_segment(filters));
        QueryKey::new(segments)
    }

    pub fn trend(metric_name: &str, controller_id: &str, start: &str, end: &str, interval: Option<&str>) -> QueryKey {
        let mut segments = vec![
            ROOT.to_string(),
            "trend".to_string(),
            metric_name.to_string(),
            controller_id.to_string(),
            start.to_string(),
            end.to_string(),
        ];
        segments.extend(interval.map(str::to_string));
        QueryKey::new(segments)
    }

    pub fn historical(controller_id: &str, parameter: &str, start: &str, end: &str) -> QueryKey {
        QueryKey::from([GRAPHQL_ROOT, "historical-measurements", controller_id, parameter, start, end])
    }

    pub fn latest(controller_id: &str) -> QueryKey {
        QueryKey::from([GRAPHQL_ROOT, "latest-measurement", controller_id])
    }
}

/// Re-run `fetch` every `every`, first tick immediately. Slow fetches delay
/// the next tick instead of bunching them up.
pub fn poll<T, F, Fut>(every: Duration, fetch: F) -> impl Stream<Item = ClientResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    stream::unfold((interval, fetch), |(mut interval, mut fetch)| async move {
        interval.tick().await;
        let item = fetch().await;
        Some((item, (interval, fetch)))
    })
}

#[derive(Debug, Clone)]
pub struct AnalyticsApi {
    graphql: GraphQlClient,
    cache: QueryCache,
}

impl AnalyticsApi {
    pub fn new(graphql: GraphQlClient, cache: QueryCache) -> Self {
        Self { graphql, cache }
    }

    /// Run a query and pull its single top-level field out of `data`.
    async fn request<T: DeserializeOwned>(&self, query: &str, field: &str, variables: Value) -> ClientResult<T> {
        let mut data: Value = self.graphql.query(query, variables).await?;
        let value = data
            .get_mut(field)
            .map(Value::take)
            .filter(|value| !value.is_null())
            .ok_or(ClientError::EmptyBody)?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn supported_metrics(&self) -> ClientResult<Option<Vec<String>>> {
        self.cache
            .fetch(keys::supported_metrics(), &QueryOptions::new(SUPPORTED_METRICS_STALE), || {
                self.request(queries::GET_SUPPORTED_METRICS, "getSupportedMetrics", json!({}))
            })
            .await
    }

    pub async fn health(&self) -> ClientResult<Option<AnalyticsHealth>> {
        self.cache
            .fetch(keys::health(), &QueryOptions::new(HEALTH_STALE), || {
                self.request(queries::GET_ANALYTICS_HEALTH, "getAnalyticsHealth", json!({}))
            })
            .await
    }

    pub async fn single_metric_report(
        &self,
        metric_name: &str,
        controller_id: &str,
        filters: Option<&AnalyticsFilterInput>,
    ) -> ClientResult<Option<AnalyticsReport>> {
        let variables = json!({
            "metricName": metric_name,
            "controllerId": controller_id,
            "filters": filters,
        });
        self.cache
            .fetch(
                keys::single_metric(metric_name, controller_id, filters),
                &QueryOptions::new(REPORT_STALE),
                || self.request(queries::GET_SINGLE_METRIC_REPORT, "getSingleMetricReport", variables.clone()),
            )
            .await
    }

    pub async fn multi_metric_report(&self, input: &MultiMetricReportInput) -> ClientResult<Option<MultiMetricReport>> {
        let variables = json!({ "input": input });
        self.cache
            .fetch(
                keys::multi_metric(&input.controllers, &input.metrics, input.filters.as_ref()),
                &QueryOptions::new(REPORT_STALE),
                || self.request(queries::GET_MULTI_METRIC_REPORT, "getMultiMetricReport", variables.clone()),
            )
            .await
    }

    pub async fn trend_analysis(&self, input: &TrendAnalysisInput) -> ClientResult<Option<TrendAnalysis>> {
        let variables = json!({ "input": input });
        let key = keys::trend(
            &input.metric_name,
            &input.controller_id,
            &input.start_time,
            &input.end_time,
            input.interval.as_deref(),
        );
        self.cache
            .fetch(key, &QueryOptions::new(TREND_STALE), || {
                self.request(queries::GET_TREND_ANALYSIS, "getTrendAnalysis", variables.clone())
            })
            .await
    }

    pub async fn historical_measurements(
        &self,
        input: &HistoricalQueryInput,
    ) -> ClientResult<Option<HistoricalMeasurements>> {
        let variables = json!({ "input": input });
        let key = keys::historical(&input.controller_id, &input.parameter, &input.start_time, &input.end_time);
        self.cache
            .fetch(key, &QueryOptions::new(HISTORICAL_STALE), || {
                self.request(queries::GET_HISTORICAL_MEASUREMENTS, "getHistoricalMeasurements", variables.clone())
            })
            .await
    }

    /// Always refetched; pair with [`AnalyticsApi::watch_latest`] for live views.
    pub async fn latest_measurement(&self, controller_id: &str) -> ClientResult<Option<LatestMeasurementStatus>> {
        let variables = json!({ "controllerId": controller_id });
        self.cache
            .fetch(keys::latest(controller_id), &QueryOptions::new(Duration::ZERO), || {
                self.request(queries::GET_LATEST_MEASUREMENT, "getLatestMeasurement", variables.clone())
            })
            .await
    }

    /// Last 24 hours of the four plant parameters for one controller.
    pub async fn plant_chart(&self, controller_id: &str) -> ClientResult<PlantChart> {
        let input = PlantChart::input_for(controller_id, Utc::now());
        let report = self.multi_metric_report(&input).await?;
        Ok(report.as_ref().map(PlantChart::from_report).unwrap_or_default())
    }

    /// Hourly trend of one metric over the last `hours`.
    pub async fn trend_series(&self, controller_id: &str, metric_name: &str, hours: i64) -> ClientResult<Option<TrendSeries>> {
        let input = TrendSeries::input_for(controller_id, metric_name, hours, Utc::now());
        let analysis = self.trend_analysis(&input).await?;
        Ok(analysis.as_ref().map(TrendSeries::from_analysis))
    }

    /// Last hour of every plant parameter, fetched concurrently.
    pub async fn realtime_snapshot(&self, controller_id: &str) -> ClientResult<RealtimeSnapshot> {
        let now = Utc::now();
        let input = |parameter: &str| RealtimeSnapshot::input_for(controller_id, parameter, REALTIME_WINDOW_HOURS, now);
        let (temperature, air_humidity, soil_humidity, light) = (
            input(TEMPERATURE),
            input(AIR_HUMIDITY),
            input(SOIL_HUMIDITY),
            input(LIGHT_INTENSITY),
        );

        let (temperature, air_humidity, soil_humidity, light) = futures::try_join!(
            self.historical_measurements(&temperature),
            self.historical_measurements(&air_humidity),
            self.historical_measurements(&soil_humidity),
            self.historical_measurements(&light),
        )?;

        let points = |series: Option<HistoricalMeasurements>| series.map(|s| s.data_points).unwrap_or_default();
        Ok(RealtimeSnapshot {
            temperature: points(temperature),
            air_humidity: points(air_humidity),
            soil_humidity: points(soil_humidity),
            light: points(light),
        })
    }

    pub fn watch_health(&self) -> impl Stream<Item = ClientResult<Option<AnalyticsHealth>>> {
        let api = self.clone();
        poll(HEALTH_POLL, move || {
            let api = api.clone();
            async move { api.health().await }
        })
    }

    pub fn watch_latest(&self, controller_id: &str) -> impl Stream<Item = ClientResult<Option<LatestMeasurementStatus>>> {
        let api = self.clone();
        let controller_id = controller_id.to_string();
        poll(LATEST_POLL, move || {
            let api = api.clone();
            let controller_id = controller_id.clone();
            async move { api.latest_measurement(&controller_id).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn multi_metric_key_ignores_order() {
        let a = keys::multi_metric(
            &["c2".to_string(), "c1".to_string()],
            &["temperature".to_string(), "air_humidity".to_string()],
            None,
        );
        let b = keys::multi_metric(
            &["c1".to_string(), "c2".to_string()],
            &["air_humidity".to_string(), "temperature".to_string()],
            None,
        );
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[analytics, multi-metric, c1,c2, air_humidity,temperature]");
    }

    #[test]
    fn blank_inputs_disable_queries() {
        assert!(!keys::single_metric("temperature", "", None).is_enabled());
        assert!(!keys::multi_metric(&[], &["temperature".to_string()], None).is_enabled());
        assert!(!keys::latest("").is_enabled());
        assert!(keys::historical("c1", "temperature", "a", "b").is_enabled());
    }

    #[test]
    fn filters_extend_the_key() {
        let filters = AnalyticsFilterInput {
            limit: Some(10),
            ..Default::default()
        };
        let key = keys::single_metric("temperature", "c1", Some(&filters));
        assert_eq!(key.segments().len(), 5);
        assert_eq!(key.segments()[4], r#"{"limit":10}"#);
    }

    #[tokio::test]
    async fn poll_yields_each_tick() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let ticks: Vec<ClientResult<u32>> = poll(Duration::from_millis(5), move || {
            let counter = counter.clone();
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst)) }
        })
        .take(3)
        .collect()
        .await;

        let values: Vec<u32> = ticks.into_iter().map(|tick| tick.unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
