//! Scan the readings table and write the dashboard figures as JSON.
//!
//! Usage: `dashboard [OUT]`. Without `OUT` the document goes to stdout.

use psychro_cloud::dashboard::Dashboard;
use psychro_cloud::store::JsonLinesStore;

/// A minimal main function that loads the table and renders the figures.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let table = psychro_cloud::table_name();
    let store = JsonLinesStore::open(psychro_cloud::data_dir(), &table)?;
    log::info!("Reading table {} from {}", table, store.path().display());

    let dashboard = Dashboard::load(&store)?;
    let document = serde_json::to_string_pretty(&dashboard)?;

    match std::env::args_os().nth(1) {
        Some(path) => {
            std::fs::write(&path, document)?;
            log::info!("Wrote {} rows to {}", dashboard.rows, path.to_string_lossy());
        }
        None => println!("{document}"),
    }

    Ok(())
}
