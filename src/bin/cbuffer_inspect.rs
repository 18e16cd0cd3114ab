//! Print the packed layout of a TOML schema file
//!
//! Usage: cbuffer_inspect <schema.toml> [--json]

use anyhow::{bail, Context};

use dynamic_cbuffer::layout::LayoutRegistry;
use dynamic_cbuffer::schema::SchemaDesc;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = run() {
        log::error!("cbuffer_inspect failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let mut path = None;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            _ if path.is_none() => path = Some(arg),
            _ => bail!("unexpected argument '{}'", arg),
        }
    }
    let Some(path) = path else {
        bail!("usage: cbuffer_inspect <schema.toml> [--json]");
    };

    let schema = SchemaDesc::from_path(&path)?;
    let mut raw = schema
        .to_raw_layout()
        .with_context(|| format!("invalid schema in {}", path))?;
    let cooked = LayoutRegistry::global()
        .try_intern(&mut raw)
        .with_context(|| format!("cannot pack schema in {}", path))?;
    let description = cooked.describe()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&description)?);
    } else {
        println!("=== {} ===", path);
        print!("{}", description.debug_string());
    }

    Ok(())
}
