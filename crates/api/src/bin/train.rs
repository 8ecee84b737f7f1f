//! Offline training: fit the delay model on a labelled JSON dataset and
//! persist it where the API server will load it.

use api::{init_logging, train, ServiceConfig};
use flight_features::RawFlightRecord;
use std::fs::File;
use std::io::BufReader;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = std::env::args()
        .nth(1)
        .ok_or("usage: delay-train <dataset.json>")?;
    let config = ServiceConfig::load()?;
    init_logging(&config.log_level)?;

    let records: Vec<RawFlightRecord> =
        serde_json::from_reader(BufReader::new(File::open(&dataset)?))?;
    info!("Read {} records from {}", records.len(), dataset);

    let report = train(&config, &records)?;
    info!("Model written to {} (accuracy {:.3})", config.model_path, report.accuracy());
    Ok(())
}
