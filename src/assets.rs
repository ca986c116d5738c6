use std::path::{Path, PathBuf};

const UI_DIR_ENV: &str = "SHARKLEPAL_UI_DIR";
const DOCUMENT: &str = "index.html";

/// Find the directory containing the renderer document
pub fn find_ui_document() -> Option<PathBuf> {
    let mut search_paths: Vec<PathBuf> = vec![
        // Development: when running from the project root
        PathBuf::from("ui"),
        PathBuf::from("../ui"),
        // System paths for installed builds
        PathBuf::from("/usr/share/sharklepal/ui"),
        PathBuf::from("/usr/local/share/sharklepal/ui"),
    ];

    // Same directory as the current executable (bundled)
    if let Some(exe_ui) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.join("ui")))
    {
        search_paths.insert(2, exe_ui);
    }

    // Explicit override comes first
    if let Some(dir) = std::env::var_os(UI_DIR_ENV) {
        search_paths.insert(0, PathBuf::from(dir));
    }

    first_document(&search_paths)
}

fn first_document(search_paths: &[PathBuf]) -> Option<PathBuf> {
    search_paths
        .iter()
        .map(|dir| dir.join(DOCUMENT))
        .find(|document| document.is_file())
        .map(|document| absolute(&document))
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn skips_directories_without_document() {
        let empty = tempdir().unwrap();
        let ui = tempdir().unwrap();
        std::fs::write(ui.path().join(DOCUMENT), "<html></html>").unwrap();

        let found = first_document(&[empty.path().to_path_buf(), ui.path().to_path_buf()]);
        assert_eq!(found, Some(absolute(&ui.path().join(DOCUMENT))));
    }

    #[test]
    fn nothing_found() {
        let empty = tempdir().unwrap();
        assert_eq!(first_document(&[empty.path().to_path_buf()]), None);
    }
}
