//! OSRM Table API client.
//!
//! One request per origin batch: the origin is coordinate 0 and the only
//! source, the destinations follow. Durations and distances come back as
//! one row each.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#table-service>

use chrono::Duration;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{PointLocation, WalkingCosts};

use super::{CostMap, DistanceClient, DistanceError, OsrmConfig};

/// OSRM Table API response.
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    /// `"Ok"` on success, otherwise an error code such as `"InvalidQuery"`
    pub code: String,

    /// Error message when `code` is not `"Ok"`
    pub message: Option<String>,

    /// Seconds; `None` where no route exists
    pub durations: Option<Vec<Vec<Option<f64>>>>,

    /// Metres; only present when requested via `annotations`
    pub distances: Option<Vec<Vec<Option<f64>>>>,
}

impl TableResponse {
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }

    /// Convert the source row into costs for `destinations`.
    fn into_costs(self, destinations: &[PointLocation]) -> Result<CostMap, DistanceError> {
        if !self.is_ok() {
            return Err(DistanceError::Status {
                message: self.message.unwrap_or_default(),
                code: self.code,
            });
        }
        let durations = self
            .durations
            .and_then(|rows| rows.into_iter().next())
            .ok_or_else(|| DistanceError::Malformed("missing durations row".to_string()))?;
        // Column 0 is the origin itself.
        if durations.len() != destinations.len() + 1 {
            return Err(DistanceError::Malformed(format!(
                "expected {} durations, got {}",
                destinations.len() + 1,
                durations.len()
            )));
        }
        let distances = self.distances.and_then(|rows| rows.into_iter().next());

        let mut out = CostMap::with_capacity(destinations.len());
        for (i, dest) in destinations.iter().enumerate() {
            let Some(secs) = durations[i + 1] else {
                continue;
            };
            let metres = distances
                .as_ref()
                .and_then(|row| row.get(i + 1).copied().flatten())
                .map(|m| m.round().clamp(0.0, f64::from(u32::MAX)) as u32);
            let duration = Duration::seconds(secs.max(0.0).ceil() as i64);
            out.insert(dest.clone(), WalkingCosts::new(duration, metres));
        }
        Ok(out)
    }
}

/// Exact walking costs from an OSRM server.
///
/// Blocking: visitor threads call this directly. Wrap in
/// [`SplittingDistanceClient`](super::SplittingDistanceClient) to respect the
/// server's table size limit.
#[derive(Debug, Clone)]
pub struct OsrmDistanceClient {
    http: reqwest::blocking::Client,
    config: OsrmConfig,
}

impl OsrmDistanceClient {
    pub fn new(config: OsrmConfig) -> Result<Self, DistanceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    /// `{base}/table/v1/{profile}/{lon,lat;...}`
    fn table_url(&self, origin: &PointLocation, destinations: &[PointLocation]) -> String {
        let coords: Vec<String> = std::iter::once(origin)
            .chain(destinations)
            .map(|l| {
                let p = l.point();
                format!("{:.6},{:.6}", p.lon, p.lat)
            })
            .collect();
        format!(
            "{}/table/v1/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords.join(";")
        )
    }
}

impl DistanceClient for OsrmDistanceClient {
    fn walking_costs(
        &self,
        origin: &PointLocation,
        destinations: &[PointLocation],
    ) -> Result<CostMap, DistanceError> {
        if destinations.is_empty() {
            return Ok(CostMap::new());
        }
        let url = self.table_url(origin, destinations);
        let response = self
            .http
            .get(&url)
            .query(&[("sources", "0"), ("annotations", "duration,distance")])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        // OSRM reports errors as JSON with a non-Ok code, often on a 400.
        let table: TableResponse = match serde_json::from_str(&body) {
            Ok(table) => table,
            Err(_) if !status.is_success() => {
                return Err(DistanceError::Status {
                    code: status.as_u16().to_string(),
                    message: body.chars().take(500).collect(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let costs = table.into_costs(destinations)?;
        debug!(
            origin = %origin.key(),
            requested = destinations.len(),
            routed = costs.len(),
            "Fetched OSRM table"
        );
        Ok(costs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::mock::{landmark, stop_at};
    use crate::domain::GeoPoint;

    fn dests() -> Vec<PointLocation> {
        vec![
            stop_at("A", GeoPoint::new(51.5, -0.12)),
            stop_at("B", GeoPoint::new(51.51, -0.13)),
        ]
    }

    #[test]
    fn success_response_maps_to_costs() {
        let json = r#"{
            "code": "Ok",
            "durations": [[0.0, 120.4, null]],
            "distances": [[0.0, 160.6, null]]
        }"#;
        let table: TableResponse = serde_json::from_str(json).unwrap();
        let d = dests();
        let costs = table.into_costs(&d).unwrap();

        assert_eq!(costs.len(), 1);
        let a = costs[&d[0]];
        assert_eq!(a.duration(), Duration::seconds(121));
        assert_eq!(a.distance_m(), Some(161));
    }

    #[test]
    fn missing_distances_are_unknown() {
        let json = r#"{"code": "Ok", "durations": [[0.0, 30.0, 40.0]]}"#;
        let table: TableResponse = serde_json::from_str(json).unwrap();
        let costs = table.into_costs(&dests()).unwrap();
        assert_eq!(costs.len(), 2);
        assert!(costs.values().all(|c| c.distance_or_sentinel() == -1));
    }

    #[test]
    fn error_code_becomes_status_error() {
        let json = r#"{"code": "InvalidQuery", "message": "Coordinates are invalid"}"#;
        let table: TableResponse = serde_json::from_str(json).unwrap();
        let err = table.into_costs(&dests()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "routing service returned InvalidQuery: Coordinates are invalid"
        );
    }

    #[test]
    fn short_row_is_malformed() {
        let json = r#"{"code": "Ok", "durations": [[0.0, 30.0]]}"#;
        let table: TableResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            table.into_costs(&dests()),
            Err(DistanceError::Malformed(_))
        ));
    }

    #[test]
    fn table_url_lists_origin_first() {
        let client = OsrmDistanceClient::new(
            OsrmConfig::new("http://localhost:5000/").with_profile("foot"),
        )
        .unwrap();
        let origin = landmark("L", GeoPoint::new(51.49, -0.11));
        let url = client.table_url(&origin, &dests());
        assert_eq!(
            url,
            "http://localhost:5000/table/v1/foot/-0.110000,51.490000;-0.120000,51.500000;-0.130000,51.510000"
        );
    }
}
