use pronord_core::{Config, Paths};

pub fn show() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn init(force: bool) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config_path = paths.config_file();

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    Config::default().save(&config_path)?;
    println!("wrote {}", config_path.display());
    Ok(())
}
