use clap::Subcommand;
use futures::StreamExt;

use crate::cli::utils::{output_item, output_list};
use crate::cli::{Context, OutputFormat};
use crate::client::analytics::{SeriesPoint, PLANT_METRICS};

#[derive(Subcommand)]
pub enum AnalyticsCommands {
    #[command(about = "List metrics the analytics service can compute")]
    Metrics,

    #[command(about = "Analytics service and InfluxDB health")]
    Health,

    #[command(about = "Last 24 hours of a controller's plant readings")]
    Chart {
        #[arg(help = "Controller ID")]
        controller: String,
    },

    #[command(about = "Hourly trend of one metric")]
    Trend {
        #[arg(help = "Controller ID")]
        controller: String,
        #[arg(help = "Metric name", value_parser = clap::builder::PossibleValuesParser::new(PLANT_METRICS))]
        metric: String,
        #[arg(long, default_value_t = 24, help = "Window in hours")]
        hours: i64,
    },

    #[command(about = "Latest measurement of a controller")]
    Latest {
        #[arg(help = "Controller ID")]
        controller: String,
    },

    #[command(about = "Poll the latest measurement every few seconds")]
    Watch {
        #[arg(help = "Controller ID")]
        controller: String,
        #[arg(long, help = "Stop after this many updates")]
        count: Option<usize>,
    },
}

fn series_line(point: &SeriesPoint) -> String {
    format!("{}\t{:.2}", point.time, point.value)
}

pub async fn handle(cmd: AnalyticsCommands, ctx: &Context) -> anyhow::Result<()> {
    let analytics = ctx.client.analytics();

    match cmd {
        AnalyticsCommands::Metrics => {
            let metrics = analytics.supported_metrics().await?.unwrap_or_default();
            output_list(&ctx.output, "metrics", &metrics, "No metrics available", String::clone)
        }
        AnalyticsCommands::Health => {
            let health = analytics
                .health()
                .await?
                .ok_or_else(|| anyhow::anyhow!("No health report returned"))?;
            output_item(&ctx.output, &health, |health| {
                println!("Status: {}", health.status);
                println!("Service: {}", health.service);
                println!("InfluxDB: {} ({})", health.influxdb, health.influxdb_url);
                println!("Checked: {}", health.timestamp);
            })
        }
        AnalyticsCommands::Chart { controller } => {
            let chart = analytics.plant_chart(&controller).await?;
            output_item(&ctx.output, &chart, |chart| {
                if !chart.has_data() {
                    println!("No readings in the last 24 hours");
                    return;
                }
                println!("time\ttemp\thumidity\tsoil\tlight");
                for point in &chart.points {
                    let cell = |value: Option<f64>| value.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".into());
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        point.time,
                        cell(point.temperature),
                        cell(point.humidity),
                        cell(point.soil_humidity),
                        cell(point.light_level)
                    );
                }
                let current = chart.current();
                println!(
                    "Current: {:.1}°C, {:.1}% air, {:.1}% soil, {:.0} lux",
                    current.temperature, current.air_humidity, current.soil_humidity, current.light_level
                );
            })
        }
        AnalyticsCommands::Trend {
            controller,
            metric,
            hours,
        } => {
            let series = analytics
                .trend_series(&controller, &metric, hours)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No trend data returned"))?;
            match &ctx.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series)?),
                OutputFormat::Text => {
                    output_list(&ctx.output, "points", &series.points, "No data points", series_line)?;
                    let summary = series.summary;
                    println!(
                        "avg {:.2}  min {:.2}  max {:.2}  ({} points)",
                        summary.average, summary.min, summary.max, summary.total_points
                    );
                }
            }
            Ok(())
        }
        AnalyticsCommands::Latest { controller } => {
            let latest = analytics
                .latest_measurement(&controller)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No measurement status returned"))?;
            output_item(&ctx.output, &latest, |latest| {
                println!("{}: {} ({:.1} min old)", latest.controller_id, latest.status, latest.data_age_minutes);
                if let Some(measurement) = &latest.measurement {
                    println!("{} = {} {}", measurement.metric_name, measurement.value, measurement.unit);
                }
            })
        }
        AnalyticsCommands::Watch { controller, count } => {
            let updates = analytics.watch_latest(&controller);
            futures::pin_mut!(updates);

            let mut seen = 0;
            while let Some(update) = updates.next().await {
                match update {
                    Ok(Some(latest)) => match &ctx.output {
                        OutputFormat::Json => println!("{}", serde_json::to_string(&latest)?),
                        OutputFormat::Text => println!(
                            "[{}] {} {}",
                            latest.last_checked,
                            latest.status,
                            latest
                                .measurement
                                .as_ref()
                                .map(|m| format!("{}={}", m.metric_name, m.value))
                                .unwrap_or_default()
                        ),
                    },
                    Ok(None) => anyhow::bail!("Controller id is required"),
                    Err(err) => tracing::warn!("Polling failed: {}", err),
                }

                seen += 1;
                if count.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            Ok(())
        }
    }
}
