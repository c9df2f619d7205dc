use astra_backend::{
    api::{FirebaseAuth, FirestoreApi, GeminiApi, MemoryStore},
    http,
    traits::DocumentStore,
    util, Status, Tracing,
};
use clap::Parser;
use std::{env, sync::Arc};
use tracing::{info, warn};
use warp::{self, Filter};

#[derive(Parser)]
struct Opts {
    /// Port number to use for listening to HTTP requests.
    #[clap(short, long, default_value = "8080")]
    port: u16,

    /// JSON file that contains application keys for astra service.
    #[clap(long, default_value = "keys.json")]
    key_store: String,

    #[clap(long)]
    prod_tracing: bool,

    /// Serve from an in-process document store instead of Firestore. Data is
    /// lost on exit.
    #[clap(long)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> Result<(), Status> {
    let opts: Opts = Opts::parse();
    let keys = util::keys::Keys::from_file(&opts.key_store)?;

    match opts.prod_tracing {
        false => Tracing::setup("astra-http")?,
        true => Tracing::setup_prod(&keys.firebase.project_id, "http_logs")?,
    }

    // Let ENV VAR override flag.
    let port: u16 = match env::var("PORT") {
        Ok(port) => match port.parse::<u16>() {
            Ok(port) => port,
            Err(_) => opts.port,
        },
        Err(_) => opts.port,
    };

    let verifier = Arc::new(FirebaseAuth::new(&keys.firebase.project_id));
    let model = Arc::new(GeminiApi::new(keys.gemini.clone()));
    if keys.gemini.api_key.is_empty() {
        warn!("no Gemini API key configured, recommendations will fail");
    }

    match opts.memory_store {
        false => {
            let firestore = FirestoreApi::connect(&keys.firebase.project_id).await?;
            serve(Arc::new(firestore), verifier, model, port).await
        }
        true => serve(Arc::new(MemoryStore::new()), verifier, model, port).await,
    }

    Ok(())
}

async fn serve<S: DocumentStore + 'static>(
    store: Arc<S>,
    verifier: Arc<FirebaseAuth>,
    model: Arc<GeminiApi>,
    port: u16,
) {
    info!("astra http server started on port {port}");

    warp::serve(
        http::routes::routes(store, verifier, model).with(
            warp::cors()
                .allow_methods(vec!["GET", "POST", "DELETE"])
                .allow_headers(vec!["Content-Type", "Authorization"])
                .allow_any_origin()
                .allow_credentials(true),
        ),
    )
    .run(([0, 0, 0, 0], port))
    .await;
}
