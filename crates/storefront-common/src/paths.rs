//! Upload filename utilities.
//!
//! Uploaded images are accepted by the extension of the client-declared
//! filename. The extension is also used as the stored extension of every
//! derivative, so it is normalized here (`jpeg` becomes `jpg`).

/// Extensions accepted for product image uploads.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Extract the lowercase extension of a filename.
///
/// Returns `None` when the name has no `.` or ends with one.
///
/// # Examples
///
/// ```
/// use storefront_common::paths::file_extension;
///
/// assert_eq!(file_extension("photo.JPG").as_deref(), Some("jpg"));
/// assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
/// assert_eq!(file_extension("README"), None);
/// ```
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Validate an upload filename and return the extension derivatives are stored under.
///
/// # Examples
///
/// ```
/// use storefront_common::paths::normalized_image_extension;
///
/// assert_eq!(normalized_image_extension("photo.JPG"), Some("jpg"));
/// assert_eq!(normalized_image_extension("photo.jpeg"), Some("jpg"));
/// assert_eq!(normalized_image_extension("logo.PNG"), Some("png"));
/// assert_eq!(normalized_image_extension("art.bmp"), None);
/// ```
pub fn normalized_image_extension(filename: &str) -> Option<&'static str> {
    let ext = file_extension(filename)?;
    let matched = IMAGE_EXTENSIONS.iter().find(|e| **e == ext)?;
    Some(match *matched {
        "jpeg" => "jpg",
        other => other,
    })
}

/// Get the list of accepted upload extensions.
#[must_use]
pub fn image_extensions() -> &'static [&'static str] {
    IMAGE_EXTENSIONS
}
