//! Locate command - report where the identifier of one document was found.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use idmask_core::locate::Locator;
use idmask_core::pdf::load_fragments;

use super::load_config;

/// Arguments for the locate command.
#[derive(Args)]
pub struct LocateArgs {
    /// PDF document to inspect
    input: PathBuf,

    /// Page to search (0-indexed, overrides the config)
    #[arg(short, long)]
    page: Option<usize>,

    /// Include the extracted text fragments in the output
    #[arg(long)]
    fragments: bool,
}

pub async fn run(args: LocateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(page) = args.page {
        config.detection.page_index = page;
    }

    let data = fs::read(&args.input)?;
    let fragments = load_fragments(&data, config.detection.page_index)?;

    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let locator = Locator::new(config.detection);
    let filename_id = locator.filename_id(&file_name);
    let detection = locator.locate(&fragments, filename_id.as_deref());

    let mut output = json!({
        "file": file_name,
        "filename_id": filename_id,
        "detection": detection,
    });
    if args.fragments {
        output["fragments"] = serde_json::to_value(&fragments)?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
