use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use storage_fs::{Config, Iri, Item, Store};

pub fn run(config: Config, input: &Path) -> Result<()> {
    let store = Store::open(config)?;

    let bytes = if input == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).context("reading stdin")?;
        buf
    } else {
        fs::read(input).with_context(|| format!("reading {}", input.display()))?
    };
    let raw: serde_json::Value = serde_json::from_slice(&bytes)?;
    let id = raw.get("id").and_then(serde_json::Value::as_str).context("object JSON must have a string `id`")?;
    let iri = Iri::parse(id)?;

    let saved = store.save(Item::new(iri, raw))?;
    println!("saved {}", saved.iri);
    Ok(())
}
