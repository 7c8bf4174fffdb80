//! Analytics service types. The GraphQL schema speaks camelCase.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    pub metric_name: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    pub calculated_at: String,
    pub controller_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub controller_id: String,
    pub generated_at: String,
    pub data_points_count: u64,
    #[serde(default)]
    pub metrics: Vec<MetricResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiMetricReport {
    pub generated_at: String,
    pub total_controllers: u64,
    pub total_metrics: u64,
    #[serde(default)]
    pub reports: Vec<AnalyticsReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendDataPoint {
    pub timestamp: String,
    pub value: f64,
    #[serde(default)]
    pub interval: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub metric_name: String,
    pub controller_id: String,
    pub interval: String,
    pub generated_at: String,
    pub total_points: u64,
    pub average_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default)]
    pub data_points: Vec<TrendDataPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsHealth {
    pub status: String,
    pub service: String,
    pub influxdb: String,
    pub influxdb_url: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsFilterInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiMetricReportInput {
    pub controllers: Vec<String>,
    pub metrics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<AnalyticsFilterInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysisInput {
    pub metric_name: String,
    pub controller_id: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDataPoint {
    pub timestamp: String,
    pub controller_id: String,
    pub parameter: String,
    pub value: f64,
    #[serde(default)]
    pub sensor_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalQueryInput {
    pub controller_id: String,
    pub parameter: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalMeasurements {
    #[serde(default)]
    pub data_points: Vec<HistoricalDataPoint>,
    pub generated_at: String,
    pub total_points: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestMeasurementStatus {
    pub controller_id: String,
    pub status: String,
    pub last_checked: String,
    pub data_age_minutes: f64,
    pub measurement: Option<MetricResult>,
}
