//! Which `/images/...` requests may be answered.
//!
//! Only names listed in the survey index are served, only with an image
//! extension, and only from inside the image directory. The CSV logs and the
//! session database may share that directory, so existing on disk is never
//! enough.

use axum::http::StatusCode;
use std::path::{Component, Path, PathBuf};
use survey_core::index::ImageCatalog;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// An image request that is refused, with the status it is answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDenied {
    pub code: &'static str,
    pub status: StatusCode,
    pub message: String,
}

impl ImageDenied {
    fn new(status: StatusCode, code: &'static str, message: &str) -> Self {
        Self {
            code,
            status,
            message: message.to_string(),
        }
    }

    fn forbidden(message: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, "E_PERMISSION_DENIED", message)
    }
}

impl std::fmt::Display for ImageDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_image_name(name: &str) -> bool {
    extension(Path::new(name)).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Resolves a requested image name to a file under `root_canon`.
///
/// Checked in order: the name is non-empty, stays inside the root
/// lexically, has an image extension, is listed in `listed`, and (if it
/// exists) does not resolve through a symlink to somewhere outside the root.
pub fn resolve_image(
    root_canon: &Path,
    listed: &ImageCatalog,
    requested: &str,
) -> Result<PathBuf, ImageDenied> {
    if requested.trim().is_empty() {
        return Err(ImageDenied::new(
            StatusCode::BAD_REQUEST,
            "E_INVALID_REQUEST",
            "image name is empty",
        ));
    }

    let up = Path::new(requested);
    if up.is_absolute() {
        return Err(ImageDenied::forbidden("absolute paths are not allowed"));
    }

    let mut out = PathBuf::from(root_canon);
    let root_len = out.components().count();
    for c in up.components() {
        match c {
            Component::CurDir => {}
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                if out.components().count() <= root_len {
                    return Err(ImageDenied::forbidden("path escapes image directory"));
                }
                out.pop();
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ImageDenied::forbidden("path prefixes/root are not allowed"));
            }
        }
    }

    if !is_image_name(requested) {
        return Err(ImageDenied::new(
            StatusCode::FORBIDDEN,
            "E_NOT_AN_IMAGE",
            "only image files are served",
        ));
    }
    if listed.kind_of(requested).is_none() {
        return Err(ImageDenied::new(
            StatusCode::NOT_FOUND,
            "E_NOT_LISTED",
            "image is not part of the survey",
        ));
    }

    if !out.exists() {
        return Ok(out);
    }
    let canon = std::fs::canonicalize(&out).map_err(|e| {
        ImageDenied::new(
            StatusCode::NOT_FOUND,
            "E_IMAGE_READ",
            &format!("canonicalize failed: {e}"),
        )
    })?;
    if !canon.starts_with(root_canon) {
        return Err(ImageDenied::forbidden("image resolves outside image directory"));
    }
    if canon.is_dir() {
        return Err(ImageDenied::new(
            StatusCode::NOT_FOUND,
            "E_NOT_A_FILE",
            "image name is a directory",
        ));
    }
    Ok(canon)
}

pub fn content_type_for(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
