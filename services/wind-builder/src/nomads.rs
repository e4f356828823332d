//! NOMADS GRIB-filter retrieval collaborator.
//!
//! Downloads a UGRD/VGRD subset for one forecast hour and one level from
//! the NCEP NOMADS filter endpoint. The response is streamed into a
//! scratch file so partially transferred grids never reach the decoder;
//! scratch cleanup is best-effort and never fails the fetch.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use wind_core::{GribFetch, LevelKind, LevelSpec, RetrievalRequest, WindError, WindResult};

/// HTTP timeout for one subset download.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Retrieval against the NOMADS `filter_gfs_0p25.pl` endpoint.
pub struct NomadsFetcher {
    client: Client,
    filter_url: String,
    scratch_dir: PathBuf,
}

impl NomadsFetcher {
    pub fn new(filter_url: String, scratch_dir: PathBuf) -> WindResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WindError::Retrieval(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            filter_url,
            scratch_dir,
        })
    }

    /// NOMADS level selector for a level spec.
    fn level_param(level: &LevelSpec) -> WindResult<String> {
        match (level.kind, level.pressure_hpa) {
            (LevelKind::Surface10m, _) => Ok("lev_10_m_above_ground".to_string()),
            (LevelKind::Isobaric, Some(pressure)) => Ok(format!("lev_{}_mb", pressure as u32)),
            (LevelKind::Isobaric, None) => Err(WindError::InvalidLevel {
                key: level.key.clone(),
                message: "isobaric level without pressure_hpa".to_string(),
            }),
        }
    }

    fn query_params(&self, request: &RetrievalRequest) -> WindResult<Vec<(String, String)>> {
        let file = format!(
            "gfs.t{:02}z.pgrb2.0p25.f{:03}",
            request.cycle, request.forecast_hour
        );
        let dir = format!(
            "/gfs.{}/{:02}/atmos",
            request.run_date.format("%Y%m%d"),
            request.cycle
        );
        let region = &request.region;
        let level = Self::level_param(&request.level)?;

        Ok(vec![
            ("file".to_string(), file),
            ("dir".to_string(), dir),
            ("subregion".to_string(), String::new()),
            ("leftlon".to_string(), region.min_lon.to_string()),
            ("rightlon".to_string(), region.max_lon.to_string()),
            ("toplat".to_string(), region.max_lat.to_string()),
            ("bottomlat".to_string(), region.min_lat.to_string()),
            ("var_UGRD".to_string(), "on".to_string()),
            ("var_VGRD".to_string(), "on".to_string()),
            (level, "on".to_string()),
        ])
    }

    fn scratch_path(&self, request: &RetrievalRequest) -> PathBuf {
        self.scratch_dir.join(format!(
            "gfs_{}_{:02}z_f{:03}_{}.grib2",
            request.run_date.format("%Y%m%d"),
            request.cycle,
            request.forecast_hour,
            request.level.key
        ))
    }
}

#[async_trait]
impl GribFetch for NomadsFetcher {
    async fn fetch(&self, request: &RetrievalRequest) -> WindResult<Vec<u8>> {
        let params = self.query_params(request)?;
        debug!(
            url = %self.filter_url,
            level = %request.level.key,
            forecast_hour = request.forecast_hour,
            "Requesting GRIB subset"
        );

        let response = self
            .client
            .get(&self.filter_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| WindError::Retrieval(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WindError::Retrieval(format!(
                "HTTP {} from {}",
                response.status(),
                self.filter_url
            )));
        }

        fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| WindError::Retrieval(format!("cannot create scratch dir: {e}")))?;
        let scratch = self.scratch_path(request);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&scratch)
            .await
            .map_err(|e| WindError::Retrieval(format!("cannot open scratch file: {e}")))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| WindError::Retrieval(format!("transfer failed: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| WindError::Retrieval(format!("scratch write failed: {e}")))?;
        }
        file.flush()
            .await
            .map_err(|e| WindError::Retrieval(format!("scratch flush failed: {e}")))?;
        drop(file);

        let bytes = fs::read(&scratch)
            .await
            .map_err(|e| WindError::Retrieval(format!("scratch read failed: {e}")))?;

        // Cleanup failures are never propagated, only logged.
        if let Err(e) = fs::remove_file(&scratch).await {
            warn!(path = %scratch.display(), error = %e, "Failed to remove scratch file");
        }

        if bytes.is_empty() {
            return Err(WindError::Retrieval(format!(
                "empty response for level {}",
                request.level.key
            )));
        }

        Ok(bytes)
    }
}
