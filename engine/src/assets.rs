use std::path::{Path, PathBuf};

/// Bitmap extensions that may have a print form next to them.
const BITMAP_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Print forms tried in order.
const PRINT_EXTENSIONS: [&str; 2] = ["pdf", "eps"];

/// Answers whether an asset exists, so the typesetting backend can prefer
/// a vector or print rendition of a bitmap image.
pub trait AssetProbe {
    fn exists(&self, path: &str) -> bool;
}

/// Finds nothing. Images keep their original file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetProbe for NoAssets {
    fn exists(&self, _path: &str) -> bool {
        false
    }
}

/// Looks assets up on disk relative to a base directory.
#[derive(Debug, Clone)]
pub struct FsAssets {
    base: PathBuf,
}

impl FsAssets {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        FsAssets { base: base.into() }
    }
}

impl AssetProbe for FsAssets {
    fn exists(&self, path: &str) -> bool {
        self.base.join(path).is_file()
    }
}

/// The preferred form of an image source: a `.pdf` or `.eps` sibling of a
/// bitmap when the probe finds one, otherwise `src` unchanged.
pub fn print_form(probe: &dyn AssetProbe, src: &str) -> String {
    let path = Path::new(src);
    let is_bitmap = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| BITMAP_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    if !is_bitmap {
        return src.to_string();
    }
    let Some(dot) = src.rfind('.') else {
        return src.to_string();
    };
    PRINT_EXTENSIONS
        .iter()
        .map(|ext| format!("{}.{}", &src[..dot], ext))
        .find(|candidate| probe.exists(candidate))
        .unwrap_or_else(|| src.to_string())
}
