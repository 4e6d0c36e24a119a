use anyhow::Result;
use storage_fs::Config;
use storage_fs::Store;

pub fn run(config: &Config) -> Result<()> {
    Store::clean(config)?;
    println!("removed store at {}", config.path.display());
    Ok(())
}
