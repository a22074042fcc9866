// Output naming: results land beside the source

use super::types::Mode;
use std::path::{Path, PathBuf};

const REVERSE_SUFFIX: &str = "_REW";
const BOOMERANG_SUFFIX: &str = "_boomerang";
const TEMP_REVERSED_SUFFIX: &str = "_temp_rev";
const FALLBACK_EXTENSION: &str = "mp4";

/// Containers whose muxers accept H.264 video with AAC audio
const H264_AAC_CONTAINERS: &[&str] = &["mp4", "m4v", "mov", "mkv", "avi"];

/// Extension for an encoded sibling of `source`: the source's own when its
/// container can carry the encoder's streams, otherwise `mp4`
fn output_extension(source: &Path) -> String {
    source
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|ext| {
            H264_AAC_CONTAINERS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

fn sibling_with_suffix(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let ext = output_extension(source);

    let file_name = format!("{}{}.{}", stem, suffix, ext);
    match source.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// `<stem>_REW.<ext>` or `<stem>_boomerang.<ext>` next to the source
pub fn derive_output_path(source: &Path, mode: Mode) -> PathBuf {
    match mode {
        Mode::Reverse => sibling_with_suffix(source, REVERSE_SUFFIX),
        Mode::Boomerang => sibling_with_suffix(source, BOOMERANG_SUFFIX),
    }
}

/// Intermediate reversed clip written during boomerang jobs
pub fn temp_reversed_path(source: &Path) -> PathBuf {
    sibling_with_suffix(source, TEMP_REVERSED_SUFFIX)
}
