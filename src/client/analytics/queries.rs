//! GraphQL documents understood by the analytics service.

pub const GET_SUPPORTED_METRICS: &str = r#"
  query GetSupportedMetrics {
    getSupportedMetrics
  }
"#;

pub const GET_ANALYTICS_HEALTH: &str = r#"
  query GetAnalyticsHealth {
    getAnalyticsHealth {
      status
      service
      influxdb
      influxdbUrl
      timestamp
    }
  }
"#;

pub const GET_SINGLE_METRIC_REPORT: &str = r#"
  query GetSingleMetricReport(
    $metricName: String!
    $controllerId: String!
    $filters: AnalyticsFilterInput
  ) {
    getSingleMetricReport(
      metricName: $metricName
      controllerId: $controllerId
      filters: $filters
    ) {
      controllerId
      generatedAt
      dataPointsCount
      metrics {
        metricName
        value
        unit
        calculatedAt
        controllerId
        description
      }
    }
  }
"#;

pub const GET_MULTI_METRIC_REPORT: &str = r#"
  query GetMultiMetricReport($input: MultiMetricReportInput!) {
    getMultiMetricReport(input: $input) {
      generatedAt
      totalControllers
      totalMetrics
      reports {
        controllerId
        dataPointsCount
        generatedAt
        metrics {
          metricName
          value
          unit
          calculatedAt
          controllerId
          description
        }
      }
    }
  }
"#;

pub const GET_TREND_ANALYSIS: &str = r#"
  query GetTrendAnalysis($input: TrendAnalysisInput!) {
    getTrendAnalysis(input: $input) {
      metricName
      controllerId
      interval
      generatedAt
      totalPoints
      averageValue
      minValue
      maxValue
      dataPoints {
        timestamp
        value
        interval
      }
    }
  }
"#;

pub const GET_HISTORICAL_MEASUREMENTS: &str = r#"
  query GetHistoricalMeasurements($input: HistoricalQueryInput!) {
    getHistoricalMeasurements(input: $input) {
      dataPoints {
        timestamp
        controllerId
        parameter
        value
        sensorId
      }
      generatedAt
      totalPoints
      filtersApplied {
        startTime
        endTime
        limit
        controllerId
        sensorId
        parameter
      }
    }
  }
"#;

pub const GET_LATEST_MEASUREMENT: &str = r#"
  query GetLatestMeasurement($controllerId: String!) {
    getLatestMeasurement(controllerId: $controllerId) {
      controllerId
      status
      lastChecked
      dataAgeMinutes
      measurement {
        metricName
        value
        unit
        calculatedAt
        controllerId
        description
      }
    }
  }
"#;
