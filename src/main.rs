use anyhow::Context;
use reqwest::Url;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use housing_explore::api::{self, AppState};
use housing_explore::config::{Config, StoreConfig};
use housing_explore::explore::{Explorer, PlaceholderCounters, ProfileCache};
use housing_explore::store::{
    GeoIndex, ListingRelations, ListingStore, MemoryStore, ProfileDirectory, RestStore,
};
use housing_explore::RawQuery;

fn build_explorer<S>(store: Arc<S>, config: &Config) -> Explorer
where
    S: ListingStore + GeoIndex + ListingRelations + ProfileDirectory + 'static,
{
    let profiles = Arc::new(ProfileCache::new(store.clone(), config.profile_cache_ttl));
    Explorer::over(store, profiles, Arc::new(PlaceholderCounters))
}

enum StoreHandle {
    Rest(Arc<RestStore>),
    Seed(Arc<MemoryStore>),
}

impl StoreHandle {
    fn kind(&self) -> &'static str {
        match self {
            StoreHandle::Rest(_) => "rest",
            StoreHandle::Seed(_) => "seed",
        }
    }
}

async fn open_store(config: &Config) -> anyhow::Result<StoreHandle> {
    match &config.store {
        StoreConfig::Rest {
            url,
            api_key,
            timeout,
        } => {
            info!("Using REST store at {}", url);
            let store = RestStore::new(url.clone(), api_key.clone(), *timeout)
                .context("Failed to build REST store client")?;
            Ok(StoreHandle::Rest(Arc::new(store)))
        }
        StoreConfig::Seed { path } => {
            info!("Loading seed listings from {}", path.display());
            let store = MemoryStore::load(path).await?;
            Ok(StoreHandle::Seed(Arc::new(store)))
        }
    }
}

/// `--query "<query string>"`: run one search, print it and exit
async fn run_query(explorer: Explorer, config: &Config, query: &str) -> anyhow::Result<()> {
    let url = Url::parse(&format!("http://localhost/?{}", query.trim_start_matches('?')))
        .context("Malformed query string")?;
    let raw = RawQuery::from_pairs(
        url.query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned())),
    );

    let mut session = config.session(Arc::new(explorer)).with_draft(raw);
    session.search_now();
    session.settled().await;
    let snapshot = session.snapshot();
    if let Some(failure) = snapshot.error {
        return Err(failure).context("Search failed");
    }
    let page = snapshot
        .results
        .context("Search finished without a result page")?;
    info!(
        "\n✅ {} matching listings (page {} of {})\n",
        page.pagination.total,
        page.pagination.page,
        page.pagination.total_pages.max(1)
    );

    let offset = page.pagination.offset();
    for (i, item) in page.data.iter().enumerate() {
        let listing = &item.listing;
        println!("{}. {} ({} NGN)", offset + i as u64 + 1, listing.title, listing.price);
        println!("   {}, {}", listing.location.address, listing.location.state);
        if let Some(lga) = &listing.location.lga {
            println!("   LGA: {}", lga);
        }
        println!(
            "   {} bed, {} bath, {}",
            listing.bedrooms.unwrap_or(0),
            listing.bathrooms.unwrap_or(0),
            listing.property_type
        );
        if let Some(distance) = item.distance_km {
            println!("   {:.1} km away", distance);
        }
        if let Some(owner) = &item.owner {
            println!("   Listed by {} {} days ago", owner.full_name, item.days_listed);
        }
        println!("   ID: {}", listing.id);
        println!();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    info!("🏠 Housing Explore");
    info!("==================");

    let store = open_store(&config).await?;
    let store_kind = store.kind();
    let explorer = match store {
        StoreHandle::Rest(store) => build_explorer(store, &config),
        StoreHandle::Seed(store) => build_explorer(store, &config),
    };

    let args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().position(|a| a == "--query") {
        let query = args.get(pos + 1).map(String::as_str).unwrap_or("");
        return run_query(explorer, &config, query).await;
    }

    let app = api::router(Arc::new(AppState {
        explorer,
        store_kind,
    }));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!("Listening on {}", config.bind);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
