//! Content-type lookup by file extension.

/// Content type used when the extension is missing or unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Return the content type for `source_id` based on its extension.
///
/// The match is case-insensitive. Unknown or missing extensions map to
/// [`DEFAULT_CONTENT_TYPE`].
pub fn content_type_for(source_id: &str) -> &'static str {
    let file_name = source_id.rsplit(['/', '\\']).next().unwrap_or(source_id);
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return DEFAULT_CONTENT_TYPE;
    };

    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jpe" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
