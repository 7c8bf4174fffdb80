//! Reshaping of analytics answers into chart-ready series.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{
    AnalyticsFilterInput, HistoricalDataPoint, HistoricalQueryInput, MetricResult, MultiMetricReport,
    MultiMetricReportInput, TrendAnalysis, TrendAnalysisInput,
};

pub const TEMPERATURE: &str = "temperature";
pub const AIR_HUMIDITY: &str = "air_humidity";
pub const SOIL_HUMIDITY: &str = "soil_humidity";
pub const LIGHT_INTENSITY: &str = "light_intensity";

/// The four parameters every plant controller reports.
pub const PLANT_METRICS: [&str; 4] = [TEMPERATURE, AIR_HUMIDITY, SOIL_HUMIDITY, LIGHT_INTENSITY];

const CHART_WINDOW_HOURS: i64 = 24;
const CHART_LIMIT: u32 = 100;
const REALTIME_LIMIT: u32 = 50;

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

/// `HH:MM` in UTC; unparsable timestamps are kept verbatim.
fn clock_label(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|timestamp| timestamp.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// One time bucket of the plant chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_humidity: Option<f64>,
    pub light_level: Option<f64>,
}

/// Latest readings, zero when unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CurrentReadings {
    pub temperature: f64,
    pub air_humidity: f64,
    pub soil_humidity: f64,
    pub light_level: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlantChart {
    pub points: Vec<ChartPoint>,
    pub metrics: Vec<MetricResult>,
}

impl PlantChart {
    pub const MAX_POINTS: usize = 20;

    /// Report input for the last 24 hours of one controller.
    pub fn input_for(controller_id: &str, now: DateTime<Utc>) -> MultiMetricReportInput {
        MultiMetricReportInput {
            controllers: if controller_id.is_empty() {
                Vec::new()
            } else {
                vec![controller_id.to_string()]
            },
            metrics: PLANT_METRICS.iter().map(|metric| metric.to_string()).collect(),
            filters: Some(AnalyticsFilterInput {
                start_time: Some((now - Duration::hours(CHART_WINDOW_HOURS)).to_rfc3339()),
                end_time: Some(now.to_rfc3339()),
                limit: Some(CHART_LIMIT),
            }),
        }
    }

    /// Chart of the first report; an empty report gives an empty chart.
    pub fn from_report(report: &MultiMetricReport) -> Self {
        report
            .reports
            .first()
            .map(|first| Self::from_metrics(&first.metrics))
            .unwrap_or_default()
    }

    pub fn from_metrics(metrics: &[MetricResult]) -> Self {
        let mut buckets: BTreeMap<String, ChartPoint> = BTreeMap::new();

        for metric in metrics {
            let time = clock_label(&metric.calculated_at);
            let point = buckets.entry(time.clone()).or_insert_with(|| ChartPoint {
                time,
                ..Default::default()
            });

            match metric.metric_name.as_str() {
                TEMPERATURE => point.temperature = Some(metric.value),
                AIR_HUMIDITY => point.humidity = Some(metric.value),
                SOIL_HUMIDITY => point.soil_humidity = Some(metric.value),
                LIGHT_INTENSITY => point.light_level = Some(metric.value),
                _ => {}
            }
        }

        let mut points: Vec<ChartPoint> = buckets
            .into_values()
            .filter(|point| point.temperature.is_some() || point.humidity.is_some())
            .collect();
        if points.len() > Self::MAX_POINTS {
            points.drain(..points.len() - Self::MAX_POINTS);
        }

        Self {
            points,
            metrics: metrics.to_vec(),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.points.is_empty()
    }

    pub fn current(&self) -> CurrentReadings {
        self.points
            .last()
            .map(|latest| CurrentReadings {
                temperature: latest.temperature.unwrap_or_default(),
                air_humidity: latest.humidity.unwrap_or_default(),
                soil_humidity: latest.soil_humidity.unwrap_or_default(),
                light_level: latest.light_level.unwrap_or_default(),
            })
            .unwrap_or_default()
    }

    /// Value of the first metric named like `<kind>…average`.
    pub fn metric_average(&self, kind: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|metric| metric.metric_name.contains(kind) && metric.metric_name.contains("average"))
            .map(|metric| metric.value)
    }

    fn reports(&self, kind: &str) -> bool {
        self.metrics.iter().any(|metric| metric.metric_name.contains(kind))
    }

    pub fn has_temperature(&self) -> bool {
        self.reports(TEMPERATURE)
    }

    pub fn has_humidity(&self) -> bool {
        self.reports(AIR_HUMIDITY)
    }

    pub fn has_soil_humidity(&self) -> bool {
        self.reports(SOIL_HUMIDITY)
    }

    pub fn has_light(&self) -> bool {
        self.reports(LIGHT_INTENSITY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendSummary {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub total_points: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub points: Vec<SeriesPoint>,
    pub summary: TrendSummary,
}

impl TrendSeries {
    /// Hourly trend input covering the last `hours`.
    pub fn input_for(controller_id: &str, metric_name: &str, hours: i64, now: DateTime<Utc>) -> TrendAnalysisInput {
        TrendAnalysisInput {
            metric_name: metric_name.to_string(),
            controller_id: controller_id.to_string(),
            start_time: (now - Duration::hours(hours)).to_rfc3339(),
            end_time: now.to_rfc3339(),
            interval: Some("1h".to_string()),
        }
    }

    pub fn from_analysis(analysis: &TrendAnalysis) -> Self {
        let points = analysis
            .data_points
            .iter()
            .map(|point| SeriesPoint {
                time: parse_timestamp(&point.timestamp)
                    .map(|timestamp| timestamp.format("%b %d %H:00").to_string())
                    .unwrap_or_else(|| point.timestamp.clone()),
                value: point.value,
            })
            .collect();

        Self {
            points,
            summary: TrendSummary {
                average: analysis.average_value,
                min: analysis.min_value,
                max: analysis.max_value,
                total_points: analysis.total_points,
            },
        }
    }
}

/// Recent history of the four plant parameters, one series each.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RealtimeSnapshot {
    pub temperature: Vec<HistoricalDataPoint>,
    pub air_humidity: Vec<HistoricalDataPoint>,
    pub soil_humidity: Vec<HistoricalDataPoint>,
    pub light: Vec<HistoricalDataPoint>,
}

impl RealtimeSnapshot {
    /// Historical query for one parameter over the last `hours`.
    pub fn input_for(controller_id: &str, parameter: &str, hours: i64, now: DateTime<Utc>) -> HistoricalQueryInput {
        HistoricalQueryInput {
            controller_id: controller_id.to_string(),
            parameter: parameter.to_string(),
            start_time: (now - Duration::hours(hours)).to_rfc3339(),
            end_time: now.to_rfc3339(),
            limit: Some(REALTIME_LIMIT),
        }
    }

    pub fn latest(&self) -> CurrentReadings {
        let last = |series: &[HistoricalDataPoint]| series.last().map(|point| point.value).unwrap_or_default();
        CurrentReadings {
            temperature: last(&self.temperature),
            air_humidity: last(&self.air_humidity),
            soil_humidity: last(&self.soil_humidity),
            light_level: last(&self.light),
        }
    }

    /// `HH:MM`-labelled series for a parameter name.
    pub fn series(&self, parameter: &str) -> Vec<SeriesPoint> {
        let points = match parameter {
            TEMPERATURE => &self.temperature,
            AIR_HUMIDITY => &self.air_humidity,
            SOIL_HUMIDITY => &self.soil_humidity,
            LIGHT_INTENSITY => &self.light,
            _ => return Vec::new(),
        };
        points
            .iter()
            .map(|point| SeriesPoint {
                time: clock_label(&point.timestamp),
                value: point.value,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty() && self.air_humidity.is_empty() && self.soil_humidity.is_empty() && self.light.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalyticsReport, TrendDataPoint};

    fn metric(name: &str, value: f64, at: &str) -> MetricResult {
        MetricResult {
            metric_name: name.to_string(),
            value,
            unit: String::new(),
            calculated_at: at.to_string(),
            controller_id: "ctrl-1".to_string(),
            description: None,
        }
    }

    fn point(parameter: &str, value: f64, at: &str) -> HistoricalDataPoint {
        HistoricalDataPoint {
            timestamp: at.to_string(),
            controller_id: "ctrl-1".to_string(),
            parameter: parameter.to_string(),
            value,
            sensor_id: "s-1".to_string(),
        }
    }

    #[test]
    fn buckets_metrics_by_minute() {
        let chart = PlantChart::from_metrics(&[
            metric(TEMPERATURE, 21.5, "2024-05-01T10:15:30Z"),
            metric(AIR_HUMIDITY, 60.0, "2024-05-01T10:15:59Z"),
            metric(SOIL_HUMIDITY, 35.0, "2024-05-01T10:15:00Z"),
            metric(LIGHT_INTENSITY, 800.0, "2024-05-01T09:00:00Z"),
            metric(TEMPERATURE, 20.0, "2024-05-01T08:00:00Z"),
        ]);

        // 09:00 has light only and is dropped
        let times: Vec<&str> = chart.points.iter().map(|p| p.time.as_str()).collect();
        assert_eq!(times, vec!["08:00", "10:15"]);

        let current = chart.current();
        assert_eq!(current.temperature, 21.5);
        assert_eq!(current.air_humidity, 60.0);
        assert_eq!(current.soil_humidity, 35.0);
        assert_eq!(current.light_level, 0.0);
    }

    #[test]
    fn keeps_last_twenty_points() {
        let metrics: Vec<MetricResult> = (0..30)
            .map(|minute| metric(TEMPERATURE, minute as f64, &format!("2024-05-01T12:{:02}:00Z", minute)))
            .collect();

        let chart = PlantChart::from_metrics(&metrics);
        assert_eq!(chart.points.len(), PlantChart::MAX_POINTS);
        assert_eq!(chart.points.first().unwrap().time, "12:10");
        assert_eq!(chart.current().temperature, 29.0);
    }

    #[test]
    fn averages_and_flags_come_from_metric_names() {
        let chart = PlantChart::from_metrics(&[
            metric("temperature_average", 22.0, "2024-05-01T10:00:00Z"),
            metric("soil_humidity_min", 10.0, "2024-05-01T10:00:00Z"),
        ]);

        assert_eq!(chart.metric_average(TEMPERATURE), Some(22.0));
        assert_eq!(chart.metric_average(SOIL_HUMIDITY), None);
        assert!(chart.has_temperature());
        assert!(chart.has_soil_humidity());
        assert!(!chart.has_light());
        assert!(!chart.has_data());
    }

    #[test]
    fn empty_report_gives_empty_chart() {
        let report = MultiMetricReport {
            generated_at: "2024-05-01T10:00:00Z".into(),
            total_controllers: 0,
            total_metrics: 0,
            reports: Vec::<AnalyticsReport>::new(),
        };
        let chart = PlantChart::from_report(&report);
        assert!(!chart.has_data());
        assert_eq!(chart.current(), CurrentReadings::default());
    }

    #[test]
    fn chart_input_covers_a_day() {
        let now = DateTime::parse_from_rfc3339("2024-05-02T00:00:00Z").unwrap().with_timezone(&Utc);
        let input = PlantChart::input_for("ctrl-1", now);
        let filters = input.filters.unwrap();
        assert_eq!(input.metrics.len(), 4);
        assert_eq!(filters.limit, Some(100));
        assert_eq!(filters.start_time.unwrap(), "2024-05-01T00:00:00+00:00");
        assert!(PlantChart::input_for("", now).controllers.is_empty());
    }

    #[test]
    fn trend_series_keeps_summary() {
        let analysis = TrendAnalysis {
            metric_name: TEMPERATURE.into(),
            controller_id: "ctrl-1".into(),
            interval: "1h".into(),
            generated_at: "2024-05-01T10:00:00Z".into(),
            total_points: 2,
            average_value: 21.0,
            min_value: 20.0,
            max_value: 22.0,
            data_points: vec![
                TrendDataPoint {
                    timestamp: "2024-05-01T09:00:00Z".into(),
                    value: 20.0,
                    interval: "1h".into(),
                },
                TrendDataPoint {
                    timestamp: "garbage".into(),
                    value: 22.0,
                    interval: "1h".into(),
                },
            ],
        };

        let series = TrendSeries::from_analysis(&analysis);
        assert_eq!(series.points[0].time, "May 01 09:00");
        assert_eq!(series.points[1].time, "garbage");
        assert_eq!(series.summary.total_points, 2);
        assert_eq!(series.summary.max, 22.0);
    }

    #[test]
    fn snapshot_reads_each_parameter_from_its_own_series() {
        let snapshot = RealtimeSnapshot {
            temperature: vec![point(TEMPERATURE, 19.0, "2024-05-01T10:00:00Z")],
            air_humidity: vec![point(AIR_HUMIDITY, 55.0, "2024-05-01T10:00:00Z")],
            soil_humidity: vec![
                point(SOIL_HUMIDITY, 30.0, "2024-05-01T09:00:00Z"),
                point(SOIL_HUMIDITY, 31.0, "2024-05-01T10:00:00Z"),
            ],
            light: Vec::new(),
        };

        let latest = snapshot.latest();
        assert_eq!(latest.soil_humidity, 31.0);
        assert_eq!(latest.air_humidity, 55.0);
        assert_eq!(latest.light_level, 0.0);
        assert_eq!(snapshot.series(SOIL_HUMIDITY).len(), 2);
        assert_eq!(snapshot.series(SOIL_HUMIDITY)[0].time, "09:00");
        assert!(snapshot.series("co2").is_empty());
    }
}
