use pronord_cache::PronounCache;
use pronord_core::{Config, Paths};
use pronord_credentials::{CredentialService, Header, RequestDetails};
use pronord_pipeline::{capitalize, BioApiClient, BioFetchPipeline, PronounMatcher};

/// One-shot lookup: seed the credential service with the supplied
/// tokens (fed through the same header-observation path a browser
/// shim would use), run a fetch chain and print what got cached.
pub async fn run(bearer: &str, csrf: &str, handles: &[String]) -> anyhow::Result<()> {
    let paths = Paths::new();
    paths.ensure_dirs()?;
    let config = Config::load_or_default(&paths)?;

    let (service, broker) = CredentialService::new(&config.api.session_cookie, Some(csrf));
    tokio::spawn(service.run());

    broker
        .request_observed(Some(RequestDetails {
            url: format!("https://{}/", config.api.api_host),
            headers: Some(vec![Header {
                name: "authorization".to_string(),
                value: bearer.to_string(),
            }]),
        }))
        .await;

    let cache = PronounCache::open(&paths.cache_db())?;
    let pipeline = BioFetchPipeline::new(
        BioApiClient::new(&config.api),
        broker,
        cache.clone(),
        PronounMatcher::new(&config.pronouns),
        &config.pipeline,
    );

    let cached = pipeline.request_bios(handles).await;
    println!("{} user(s) with pronouns cached", cached);

    // One-shot run: enforce the ceiling here instead of spawning the
    // periodic sweeper.
    cache.sweep(config.cache.max_entries)?;

    for handle in handles {
        if let Some(pronouns) = cache.get(Some(handle.as_str()))?.remove(handle) {
            let display: Vec<String> = pronouns.iter().map(|p| capitalize(p)).collect();
            println!("@{}: {}", handle, display.join(", "));
        }
    }

    Ok(())
}
