//! Handle one ingestion event read from stdin and print the response.
//!
//! ```text
//! echo '{"body": "{\"timestamp\": \"2024-05-17 09:00:00\", \"temperature\": 25, \"humidity\": 50}"}' \
//!     | DDB_TABLE=readings ingest
//! ```

use std::io::Read;

use psychro_cloud::ingest::{self, IngestResponse};
use psychro_cloud::store::JsonLinesStore;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut event = String::new();
    std::io::stdin().read_to_string(&mut event)?;

    let response = match JsonLinesStore::open(psychro_cloud::data_dir(), &psychro_cloud::table_name()) {
        Ok(mut store) => ingest::handle_json(&mut store, &event),
        Err(e) => {
            log::error!("Error: {}", e);
            IngestResponse::error()
        }
    };

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
