use std::{path::PathBuf, str::FromStr};

use lsp_types::Uri;
use url::Url;

pub fn create_uri_from_str(s: &str) -> Option<Uri> {
    let s = s.replace("\\", "/");
    if let Ok(uri) = Uri::from_str(&s) {
        Some(uri)
    } else {
        None
    }
}

/// `file:///a/index.html` -> `file:///a/index.<extension>`.
///
/// Query and fragment are dropped. A file name without extension gets one
/// appended. Returns `None` when the uri names a directory.
pub fn sibling_stylesheet_uri(uri: &Uri, extension: &str) -> Option<Uri> {
    let s = uri.as_str();
    let path = s.split(&['?', '#'][..]).next().unwrap_or(s);
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    if file_start == path.len() {
        return None;
    }
    let stem_end = match path[file_start..].rfind('.') {
        Some(i) if i > 0 => file_start + i,
        _ => path.len(),
    };
    create_uri_from_str(&format!("{}.{}", &path[..stem_end], extension))
}

/// Local path of a `file:` uri.
///
/// `None` for other schemes and for file uris this platform cannot map to a
/// path, such as a remote host on Unix.
pub fn file_path_from_uri(uri: &Uri) -> Option<PathBuf> {
    Url::parse(uri.as_str()).ok()?.to_file_path().ok()
}
