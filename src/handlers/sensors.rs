// handlers/sensors.rs - GET /api/sensors
//
// Closed list served locally; there is no sensors service behind it yet.

use axum::{extract::Query, Json};
use chrono::Utc;

use crate::models::{Sensor, SensorLocation};

const DEFAULT_STATUS: &str = "active";

/// Query pairs in order; a repeated `status` keeps its first value.
pub async fn get(Query(params): Query<Vec<(String, String)>>) -> Json<Vec<Sensor>> {
    let now = Utc::now();
    let status = params
        .into_iter()
        .find(|(key, _)| key == "status")
        .map(|(_, status)| status)
        .filter(|status| !status.is_empty())
        .unwrap_or_else(|| DEFAULT_STATUS.to_string());

    Json(vec![Sensor {
        id: "sensor-1".to_string(),
        name: "Humedad Invernadero".to_string(),
        kind: "humidity".to_string(),
        status,
        location: SensorLocation {
            latitude: 4.711,
            longitude: -74.072,
        },
        installed_at: now,
        last_sync_at: now,
    }])
}
