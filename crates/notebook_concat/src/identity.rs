//! Identity and initialization. Derives the synthetic concat document URI
//! and the notebook URI from the first observed cell. Sticky until a
//! refresh clears it.

use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use url::Url;

use crate::cell::CellId;

/// Derives the cell's filesystem path for identity purposes. URI parsing
/// and filesystem-path utilities proper are an external collaborator; this
/// falls back to the URI's raw path component when the cell id isn't a
/// `file:` URI `Url::to_file_path` can resolve, which is enough for
/// identity derivation.
fn cell_path(cell_id: &CellId) -> PathBuf {
    cell_id
        .uri()
        .to_file_path()
        .unwrap_or_else(|()| PathBuf::from(cell_id.uri().path()))
}

/// Derives the concat document's synthetic URI by hashing the first
/// observed cell's filesystem path with a truncated 12-hex-char SHA-1 and
/// joining it to that cell's directory.
pub fn derive_concat_uri(first_cell: &CellId) -> Url {
    let path = cell_path(first_cell);
    let mut hasher = Sha1::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    let hash: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();

    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let file_name = format!("_NotebookConcat_{hash}.py");
    let concat_path = dir.join(file_name);

    Url::from_file_path(&concat_path)
        .unwrap_or_else(|()| Url::parse("untitled:_NotebookConcat_.py").expect("valid fallback URI"))
}

/// Derives the notebook's synthetic URI from the first observed cell, by
/// one of three cases: the interactive input cell, an untitled notebook, or
/// an ordinary file-backed notebook.
pub fn derive_notebook_uri(first_cell: &CellId, interactive_scheme: &str) -> Url {
    let mut uri = first_cell.uri().clone();

    if first_cell.scheme() == interactive_scheme {
        let _ = uri.set_scheme(interactive_scheme);
        uri.set_fragment(None);
        return uri;
    }

    if first_cell.is_untitled() {
        let _ = uri.set_scheme("untitled");
        uri.set_fragment(None);
        uri.set_query(None);
        return uri;
    }

    Url::from_file_path(cell_path(first_cell))
        .unwrap_or(uri)
}
