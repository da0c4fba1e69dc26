//! Delimited export of the curated relations

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::error::util::ensure_directory;
use crate::schema::{RelationName, validate_identifier};
use crate::session::Session;
use crate::utils::io::write_csv;

/// Write every gold relation to `<dir>/<relation>.csv`
///
/// # Errors
/// Returns an error if a gold relation is missing from the session or a file
/// cannot be written
pub fn export_gold(session: &Session, dir: &Path) -> Result<Vec<PathBuf>> {
    ensure_directory(dir)?;
    RelationName::GOLD
        .into_iter()
        .map(|relation| {
            let path = dir.join(format!("{}.csv", validate_identifier(relation.as_str())?));
            write_csv(&path, session.table(relation)?)?;
            log::info!("Exported {relation} to {}", path.display());
            Ok(path)
        })
        .collect()
}
