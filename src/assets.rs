use std::path::Path;

use anyhow::Context as _;

use crate::config::SiteConfig;
use crate::document::ExtractedImage;

pub const NOTEBOOK_IMAGES_DIR: &str = "images/notebooks";

/// Copies the stylesheet, search script, static images and CNAME into the
/// output directory. Failures are logged and skipped.
pub fn copy_static_assets(config: &SiteConfig) -> usize {
    let output = &config.output_dir;
    let mut copied = 0;

    for (source, name) in [
        (&config.stylesheet, "style.css"),
        (&config.search_script, "search.js"),
    ] {
        copied += usize::from(copy_or_warn(source, &output.join(name)));
    }

    if config.images_dir.is_dir() {
        match copy_dir_files(&config.images_dir, &output.join("images")) {
            Ok(count) => copied += count,
            Err(err) => tracing::warn!("{err:#}"),
        }
    }

    if config.cname.is_file() {
        copied += usize::from(copy_or_warn(&config.cname, &output.join("CNAME")));
    }

    tracing::debug!(copied, "copied static assets");
    copied
}

/// Writes images pulled out of a notebook into the shared notebook image
/// folder. Failures are logged and skipped.
pub fn write_notebook_images(output_dir: &Path, images: &[ExtractedImage]) {
    let dir = output_dir.join(NOTEBOOK_IMAGES_DIR);
    for image in images {
        let path = dir.join(&image.file_name);
        let written = std::fs::create_dir_all(&dir)
            .with_context(|| format!("create image directory: {}", dir.display()))
            .and_then(|()| {
                std::fs::write(&path, &image.bytes)
                    .with_context(|| format!("write notebook image: {}", path.display()))
            });
        if let Err(err) = written {
            tracing::warn!("{err:#}");
        }
    }
}

fn copy_or_warn(source: &Path, dest: &Path) -> bool {
    match copy_file(source, dest) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("{err:#}");
            false
        }
    }
}

fn copy_file(source: &Path, dest: &Path) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory: {}", parent.display()))?;
    }
    std::fs::copy(source, dest).with_context(|| {
        format!("copy asset: {} -> {}", source.display(), dest.display())
    })?;
    Ok(())
}

fn copy_dir_files(source: &Path, dest: &Path) -> anyhow::Result<usize> {
    let mut copied = 0;
    for entry in std::fs::read_dir(source)
        .with_context(|| format!("read images directory: {}", source.display()))?
    {
        let entry =
            entry.with_context(|| format!("read images directory: {}", source.display()))?;
        let path = entry.path();
        if path.is_file() {
            copied += usize::from(copy_or_warn(&path, &dest.join(entry.file_name())));
        }
    }
    Ok(copied)
}
