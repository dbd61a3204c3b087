use std::path::{Path, PathBuf};

use anyhow::bail;
use directories::ProjectDirs;

/// Returns the path to the database. A bare filename is placed in the
/// platform's local data directory, anything with a directory component is
/// used as given.
pub fn database_path(database: &str) -> anyhow::Result<PathBuf> {
    let given = Path::new(database);
    if given.is_absolute() || given.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
        return Ok(given.to_path_buf());
    }

    let mut pb = match ProjectDirs::from("", "", env!("CARGO_PKG_NAME")) {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => bail!("Cannot determine path to database"),
    };

    pb.push(given);
    Ok(pb)
}
