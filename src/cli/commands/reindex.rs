use anyhow::Result;
use storage_fs::{Config, Store};

pub fn run(config: Config) -> Result<()> {
    let store = Store::open(config)?;
    store.reindex()?;
    println!("reindex complete");
    Ok(())
}
