use anyhow::Result;
use storage_fs::{Config, Iri, Store};

pub fn run(config: Config, iri: &str) -> Result<()> {
    let store = Store::open(config)?;
    let iri = Iri::parse(iri)?;
    let item = store.load(&iri, &[])?;
    println!("{}", serde_json::to_string_pretty(&item.raw)?);
    Ok(())
}
