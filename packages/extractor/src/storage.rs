//! Artifact storage.
//!
//! Each extraction is stored as `<slug>.json` (the extracted law) next to
//! `<slug>.raw.txt` (the source text it was extracted from). Verification
//! needs both.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use lawtext_core::types::ExtractedLaw;

use crate::error::{ExtractorError, Result};

const ARTIFACT_SUFFIX: &str = ".json";
const RAW_TEXT_SUFFIX: &str = ".raw.txt";

/// Path of the extracted law for `slug`.
pub fn artifact_path(dir: &Path, slug: &str) -> PathBuf {
    dir.join(format!("{slug}{ARTIFACT_SUFFIX}"))
}

/// Path of the raw source text for `slug`.
pub fn raw_text_path(dir: &Path, slug: &str) -> PathBuf {
    dir.join(format!("{slug}{RAW_TEXT_SUFFIX}"))
}

fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && !slug.starts_with('.')
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ExtractorError::InvalidInput(format!(
            "invalid slug '{slug}': use letters, digits, '-' and '_' only"
        )))
    }
}

/// Write `content` via a temp file and rename, so readers never see a
/// half-written artifact.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ExtractorError::InvalidInput(format!("invalid path {}", path.display())))?;
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content)?;
        file.sync_all()?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_file, path)?;
    Ok(())
}

/// Save an extracted law and its raw text. Returns the artifact path.
pub fn save_extraction(dir: &Path, law: &ExtractedLaw, raw_text: &str) -> Result<PathBuf> {
    validate_slug(&law.law.slug)?;
    fs::create_dir_all(dir)?;

    write_atomic(&raw_text_path(dir, &law.law.slug), raw_text.as_bytes())?;
    save_law(dir, law)
}

/// Save (or overwrite) the extracted law only.
pub fn save_law(dir: &Path, law: &ExtractedLaw) -> Result<PathBuf> {
    validate_slug(&law.law.slug)?;
    let path = artifact_path(dir, &law.law.slug);
    let json = serde_json::to_string_pretty(law)?;
    write_atomic(&path, json.as_bytes())?;
    Ok(path)
}

/// Load the extracted law for `slug`.
pub fn load_law(dir: &Path, slug: &str) -> Result<ExtractedLaw> {
    validate_slug(slug)?;
    let content = fs::read_to_string(artifact_path(dir, slug))?;
    Ok(serde_json::from_str(&content)?)
}

/// Load the raw source text for `slug`.
///
/// # Errors
/// [`ExtractorError::MissingRawText`] when the file does not exist.
pub fn load_raw_text(dir: &Path, slug: &str) -> Result<String> {
    validate_slug(slug)?;
    let path = raw_text_path(dir, slug);
    if !path.exists() {
        return Err(ExtractorError::MissingRawText {
            slug: slug.to_string(),
            path: path.display().to_string(),
        });
    }
    Ok(fs::read_to_string(path)?)
}

/// Slugs of all stored artifacts in `dir`, sorted.
pub fn list_slugs(dir: &Path) -> Result<Vec<String>> {
    let mut slugs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(slug) = name.strip_suffix(ARTIFACT_SUFFIX) {
            if validate_slug(slug).is_ok() {
                slugs.push(slug.to_string());
            }
        }
    }
    slugs.sort();
    Ok(slugs)
}
