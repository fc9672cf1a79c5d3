//! Auxiliary directories: engine fragments and support libraries.
//!
//! Only regular files directly inside a directory are used; subdirectories
//! are ignored. Files are taken in name order so output does not depend on
//! directory iteration order. A missing directory is a warning.

use std::fs;
use std::path::{Path, PathBuf};

use spwnforge_emit::EngineFragment;

use crate::error::{BuildError, BuildWarning};

/// Regular files directly inside `dir`, sorted by file name.
pub fn regular_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let read_err = |source| BuildError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read every file in `dir` as an engine fragment.
pub fn load_engine_fragments(
    dir: &Path,
    warnings: &mut Vec<BuildWarning>,
) -> Result<Vec<EngineFragment>, BuildError> {
    if !dir.is_dir() {
        let warning = BuildWarning::MissingEngineDir {
            path: dir.to_path_buf(),
        };
        log::warn!("{warning}");
        warnings.push(warning);
        return Ok(Vec::new());
    }

    let mut fragments = Vec::new();
    for path in regular_files(dir)? {
        let text = fs::read_to_string(&path).map_err(|source| BuildError::Read {
            path: path.clone(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::debug!("engine fragment {name} ({} bytes)", text.len());
        fragments.push(EngineFragment::new(name, text));
    }
    Ok(fragments)
}

/// Copy the regular files of every directory in `dirs` into `dest`.
/// Returns the destination paths. A later directory overwrites a same-named
/// file from an earlier one.
pub fn copy_libraries(
    dirs: &[PathBuf],
    dest: &Path,
    warnings: &mut Vec<BuildWarning>,
) -> Result<Vec<PathBuf>, BuildError> {
    let mut copied = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            let warning = BuildWarning::MissingLibraryDir { path: dir.clone() };
            log::warn!("{warning}");
            warnings.push(warning);
            continue;
        }
        for from in regular_files(dir)? {
            let Some(name) = from.file_name() else {
                continue;
            };
            let to = dest.join(name);
            fs::copy(&from, &to).map_err(|source| BuildError::Copy {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
            copied.push(to);
        }
        log::debug!("copied libraries from {}", dir.display());
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn copies_only_regular_files() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write(src.path(), "b.spwn", "b");
        write(src.path(), "a.spwn", "a");
        fs::create_dir(src.path().join("nested")).unwrap();
        write(&src.path().join("nested"), "deep.spwn", "deep");

        let mut warnings = Vec::new();
        let copied =
            copy_libraries(&[src.path().to_path_buf()], dest.path(), &mut warnings).unwrap();
        assert_eq!(copied, [dest.path().join("a.spwn"), dest.path().join("b.spwn")]);
        assert_eq!(fs::read_to_string(dest.path().join("b.spwn")).unwrap(), "b");
        assert!(!dest.path().join("nested").exists());
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_library_dir_is_a_warning() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        write(src.path(), "lib.spwn", "x");
        let missing = src.path().join("nope");

        let mut warnings = Vec::new();
        let copied = copy_libraries(
            &[missing.clone(), src.path().to_path_buf()],
            dest.path(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(warnings, [BuildWarning::MissingLibraryDir { path: missing }]);
    }

    #[test]
    fn engine_fragments_load_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "20-loop.spwn", "// loop\n");
        write(dir.path(), "10-setup.spwn", "// setup\n");

        let mut warnings = Vec::new();
        let fragments = load_engine_fragments(dir.path(), &mut warnings).unwrap();
        assert_eq!(
            fragments,
            [
                EngineFragment::new("10-setup.spwn", "// setup\n"),
                EngineFragment::new("20-loop.spwn", "// loop\n"),
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_engine_dir_gives_empty_section() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("engine");
        let mut warnings = Vec::new();
        let fragments = load_engine_fragments(&missing, &mut warnings).unwrap();
        assert!(fragments.is_empty());
        assert_eq!(warnings, [BuildWarning::MissingEngineDir { path: missing }]);
    }
}
