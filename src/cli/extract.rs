//! `picker extract`

use anyhow::Context;
use picker_extract::{extract_from_envelope, extract_with_source};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

pub fn run(file: Option<PathBuf>, envelope: bool) -> anyhow::Result<()> {
    let text = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let structure = if envelope {
        extract_from_envelope(&text)
    } else {
        let extraction = extract_with_source(&text);
        info!(source = %extraction.source, "Extraction finished");
        extraction.structure
    };

    let rendered =
        serde_json::to_string_pretty(&structure).context("Failed to serialize result")?;
    println!("{rendered}");
    Ok(())
}
