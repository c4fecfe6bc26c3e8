use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use quill_core::QuillConfig;

pub const CONFIG_FILE: &str = "quill.toml";

pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    let output = write_scaffold(path, force)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}

fn write_scaffold(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    let output = dir.join(CONFIG_FILE);
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    let content = QuillConfig::scaffold().to_toml_string()?;
    std::fs::write(&output, content)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(output)
}
