use std::{fs, sync::Arc};

use astra_backend::{
    api::FirestoreApi, documents::CatalogueItem, library::StoreManager, util, Tracing,
};
use clap::Parser;
use itertools::Itertools;
use tracing::info;

/// Astra util for seeding the store catalogue from a JSON file.
#[derive(Parser)]
struct Opts {
    /// JSON file that contains application keys for astra service.
    #[clap(long, default_value = "keys.json")]
    key_store: String,

    /// JSON file with an array of catalogue items.
    #[clap(long, default_value = "catalogue.json")]
    items: String,

    /// Only validate the items without writing them.
    #[clap(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    Tracing::setup("utils/populate_store")?;

    let opts: Opts = Opts::parse();
    let keys = util::keys::Keys::from_file(&opts.key_store)?;

    let text = fs::read_to_string(&opts.items)?;
    let items = serde_json::from_str::<Vec<CatalogueItem>>(&text)?
        .into_iter()
        .map(|mut item| {
            if item.id.is_empty() {
                item.id = slug(&item.title);
            }
            item
        })
        .collect_vec();
    info!("Loaded {} items from '{}'", items.len(), &opts.items);

    if opts.dry_run {
        for item in &items {
            astra_backend::library::store::validate_item(item)?;
        }
        println!("{} items are valid", items.len());
        return Ok(());
    }

    let firestore = FirestoreApi::connect(&keys.firebase.project_id).await?;
    let store = StoreManager::new(Arc::new(firestore));
    let written = store.seed_catalogue(items).await?;
    println!("Wrote {written} catalogue items");

    Ok(())
}

/// Derives a catalogue id from a title, e.g. "The Witcher 3: Wild Hunt" ->
/// "the-witcher-3-wild-hunt".
fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .join("-")
}
