//! Static build
//!
//! Writes each page's rendered output to `<out_dir>/<pattern>`.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::SiteError;
use crate::logger;
use crate::page::Page;

/// Render pages in `patterns` order, sequentially.
///
/// Stops at the first failure. Files written for earlier patterns are
/// left in place and nothing is written for the patterns after it. A copy
/// that fails partway leaves the failing pattern's file truncated.
pub(super) fn build_pages(
    patterns: &[String],
    pages: &HashMap<String, Arc<dyn Page>>,
    out_dir: &Path,
) -> Result<(), SiteError> {
    logger::log_build_start(out_dir, patterns.len());

    for pattern in patterns {
        let mut content = pages[pattern]
            .build()
            .map_err(|source| SiteError::PageBuild {
                pattern: pattern.clone(),
                source,
            })?;

        let path = output_path(out_dir, pattern);
        let written = write_file(&path, &mut content).map_err(|source| {
            logger::log_error(&format!("Failed to write '{}': {source}", path.display()));
            SiteError::FileSystem {
                path: path.clone(),
                source,
            }
        })?;
        logger::log_page_written(&path, written);
    }

    logger::log_build_finished(patterns.len());
    Ok(())
}

fn output_path(out_dir: &Path, pattern: &str) -> PathBuf {
    out_dir.join(pattern)
}

/// Create or truncate `path` and copy `content` into it. The file is
/// closed when this returns, on success and on error alike.
fn write_file(path: &Path, content: &mut impl io::Read) -> io::Result<u64> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    io::copy(content, &mut file)
}
