// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

use path_clean::clean;

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walk up from `path` looking for `filename`.
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = path.to_path_buf();

    loop {
        let file_path = current.join(filename);
        if file_path.is_file() {
            return Some(file_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Pick the configuration file to load.
///
/// An explicit path always wins (relative paths are taken from `cwd`). Otherwise the nearest
/// `default_filename` at or above `cwd` is used. `None` means run on defaults.
pub fn resolve_config_path(
    find_in_parent: FindInParent,
    cwd: &Path,
    default_filename: &str,
    cli_file: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(cli_file) = cli_file {
        if cli_file.is_absolute() {
            return Some(cli_file.to_path_buf());
        }
        return Some(clean(cwd.join(cli_file)));
    }

    find_in_parent(cwd, default_filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found(_: &Path, _: &str) -> Option<PathBuf> {
        None
    }

    fn found(_: &Path, _: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/foo/ppdag.config.yaml"))
    }

    #[test]
    fn explicit_file_wins() {
        let path = resolve_config_path(
            found,
            Path::new("/foo/bar"),
            "ppdag.config.yaml",
            Some(Path::new("/my/absolute/conf.yaml")),
        );
        assert_eq!(path, Some(PathBuf::from("/my/absolute/conf.yaml")));

        let path = resolve_config_path(
            found,
            Path::new("/foo/bar"),
            "ppdag.config.yaml",
            Some(Path::new("../conf.yaml")),
        );
        assert_eq!(path, Some(PathBuf::from("/foo/conf.yaml")));
    }

    #[test]
    fn falls_back_to_search_then_defaults() {
        let path = resolve_config_path(found, Path::new("/foo/bar"), "ppdag.config.yaml", None);
        assert_eq!(path, Some(PathBuf::from("/foo/ppdag.config.yaml")));

        let path = resolve_config_path(not_found, Path::new("/foo/bar"), "ppdag.config.yaml", None);
        assert_eq!(path, None);
    }

    #[test]
    fn finds_the_nearest_parent_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested)?;
        std::fs::write(dir.path().join("a").join("ppdag.config.yaml"), "name: x\n")?;

        assert_eq!(
            find_in_parent(&nested, "ppdag.config.yaml"),
            Some(dir.path().join("a").join("ppdag.config.yaml"))
        );
        assert_eq!(find_in_parent(&nested, "missing.yaml"), None);
        Ok(())
    }
}
