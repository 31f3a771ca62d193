use pronord_cache::PronounCache;
use pronord_core::{Config, Paths};
use pronord_pipeline::capitalize;

fn open_cache(paths: &Paths) -> anyhow::Result<PronounCache> {
    paths.ensure_dirs()?;
    Ok(PronounCache::open(&paths.cache_db())?)
}

pub fn show(handle: Option<&str>) -> anyhow::Result<()> {
    let paths = Paths::new();
    let cache = open_cache(&paths)?;
    let entries = cache.get(handle)?;

    if entries.is_empty() {
        match handle {
            Some(h) => println!("@{}: no pronouns cached", h),
            None => println!("cache is empty"),
        }
        return Ok(());
    }

    let mut sorted: Vec<_> = entries.into_iter().collect();
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (handle, pronouns) in sorted {
        let display: Vec<String> = pronouns.iter().map(|p| capitalize(p)).collect();
        println!("@{}: {}", handle, display.join(", "));
    }

    Ok(())
}

pub fn sweep() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let cache = open_cache(&paths)?;

    let removed = cache.sweep(config.cache.max_entries)?;
    println!(
        "evicted {} entr{}, {} remaining",
        removed,
        if removed == 1 { "y" } else { "ies" },
        cache.len()?
    );
    Ok(())
}

pub fn clear() -> anyhow::Result<()> {
    let paths = Paths::new();
    let cache = open_cache(&paths)?;
    cache.clear()?;
    println!("cache cleared");
    Ok(())
}
