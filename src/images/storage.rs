//! On-disk layout of derivative images.
//!
//! Derivatives live under `{root}/{bucket}/{uuid}.{ext}` where the bucket is
//! one of `thumbnails`, `main` or `original`. Products stored before the
//! multi-size layout keep a single file directly under `{root}`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};
use storefront_common::ImageReferenceSet;

use super::ImageError;

/// Kind of derivative, each stored in its own bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivativeKind {
    Thumbnail,
    Main,
    Original,
}

impl DerivativeKind {
    /// All kinds, in the order they are produced.
    pub const ALL: [DerivativeKind; 3] = [Self::Thumbnail, Self::Main, Self::Original];

    /// Directory name under the images root.
    pub fn bucket(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnails",
            Self::Main => "main",
            Self::Original => "original",
        }
    }
}

/// Filesystem manager for derivative images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl ImageStore {
    /// Create a store rooted at `root`, publishing locations under `url_prefix`.
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Images root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL prefix of published locations, without trailing slash.
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Create the root and the three bucket directories.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        for kind in DerivativeKind::ALL {
            std::fs::create_dir_all(self.root.join(kind.bucket()))?;
        }
        Ok(())
    }

    /// Filesystem path of a derivative.
    pub fn path_for(&self, kind: DerivativeKind, filename: &str) -> PathBuf {
        self.root.join(kind.bucket()).join(filename)
    }

    /// Published location of a derivative.
    pub fn location_for(&self, kind: DerivativeKind, filename: &str) -> String {
        format!("{}/{}/{}", self.url_prefix, kind.bucket(), filename)
    }

    /// Encode `img` into `path` using the format named by `ext`.
    ///
    /// `quality` applies to JPEG only. PNG is written with the best
    /// compression and adaptive filtering; WebP is lossless.
    pub fn write(
        &self,
        img: &DynamicImage,
        path: &Path,
        ext: &str,
        quality: u8,
    ) -> Result<(), ImageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        match ext {
            "jpg" => img.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))?,
            "png" => img.write_with_encoder(PngEncoder::new_with_quality(
                &mut writer,
                CompressionType::Best,
                PngFilterType::Adaptive,
            ))?,
            "gif" => DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut writer, ImageFormat::Gif)?,
            "webp" => img.write_with_encoder(WebPEncoder::new_lossless(&mut writer))?,
            other => {
                return Err(ImageError::UnsupportedFormat {
                    filename: format!("*.{}", other),
                })
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Map a published location back to a file under the images root.
    ///
    /// Locations outside the URL prefix resolve to `None`. The bucket is
    /// picked by path substring; anything else is a legacy flat file.
    pub fn resolve(&self, location: &str) -> Option<PathBuf> {
        let rest = location.strip_prefix(&self.url_prefix)?;
        if !rest.starts_with('/') {
            return None;
        }
        let filename = location.rsplit('/').next()?;
        if filename.is_empty() || filename == "." || filename == ".." {
            return None;
        }

        let bucket = DerivativeKind::ALL
            .into_iter()
            .find(|kind| location.contains(&format!("/{}/", kind.bucket())));

        Some(match bucket {
            Some(kind) => self.path_for(kind, filename),
            None => self.root.join(filename),
        })
    }

    /// Remove the files of a reference set. Missing files are ignored.
    pub fn delete(&self, images: &ImageReferenceSet) {
        let mut seen: Vec<PathBuf> = Vec::with_capacity(3);
        for location in images.iter() {
            let Some(path) = self.resolve(location) else {
                tracing::debug!("Skipping image outside {}: {}", self.url_prefix, location);
                continue;
            };
            if seen.contains(&path) {
                continue;
            }
            remove_quietly(&path);
            seen.push(path);
        }
    }
}

/// Remove a file, treating "not found" as success and logging other failures.
pub(crate) fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed image file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove image file {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ImageStore {
        ImageStore::new("/srv/images", "/images")
    }

    #[test]
    fn test_bucket_names() {
        let buckets: Vec<_> = DerivativeKind::ALL.iter().map(|k| k.bucket()).collect();
        assert_eq!(buckets, ["thumbnails", "main", "original"]);
    }

    #[test]
    fn test_location_and_path() {
        let store = store();
        assert_eq!(
            store.location_for(DerivativeKind::Main, "abc.jpg"),
            "/images/main/abc.jpg"
        );
        assert_eq!(
            store.path_for(DerivativeKind::Thumbnail, "abc.jpg"),
            PathBuf::from("/srv/images/thumbnails/abc.jpg")
        );
    }

    #[test]
    fn test_trailing_slash_prefix_is_trimmed() {
        let store = ImageStore::new("/srv/images", "/static/img/");
        assert_eq!(store.url_prefix(), "/static/img");
        assert_eq!(
            store.location_for(DerivativeKind::Original, "a.png"),
            "/static/img/original/a.png"
        );
    }

    #[test]
    fn test_resolve_buckets() {
        let store = store();
        assert_eq!(
            store.resolve("/images/thumbnails/a.jpg"),
            Some(PathBuf::from("/srv/images/thumbnails/a.jpg"))
        );
        assert_eq!(
            store.resolve("/images/original/a.jpg"),
            Some(PathBuf::from("/srv/images/original/a.jpg"))
        );
        assert_eq!(
            store.resolve("/images/a.jpg"),
            Some(PathBuf::from("/srv/images/a.jpg"))
        );
    }

    #[test]
    fn test_resolve_rejects_foreign_locations() {
        let store = store();
        assert_eq!(store.resolve("https://cdn.example.com/a.jpg"), None);
        assert_eq!(store.resolve("/imagesX/a.jpg"), None);
        assert_eq!(store.resolve("/images/main/"), None);
        assert_eq!(store.resolve("/images/main/.."), None);
    }

    #[test]
    fn test_write_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), "/images");
        store.ensure_layout().unwrap();

        let img = DynamicImage::new_rgb8(8, 8);
        let mut locations = Vec::new();
        for (kind, ext) in [
            (DerivativeKind::Thumbnail, "jpg"),
            (DerivativeKind::Main, "png"),
            (DerivativeKind::Original, "webp"),
        ] {
            let name = format!("x.{}", ext);
            let path = store.path_for(kind, &name);
            store.write(&img, &path, ext, 90).unwrap();
            assert!(path.exists());
            locations.push(store.location_for(kind, &name));
        }

        let set = ImageReferenceSet {
            thumbnail: locations[0].clone(),
            main: locations[1].clone(),
            original: locations[2].clone(),
        };
        store.delete(&set);
        for location in set.iter() {
            assert!(!store.resolve(location).unwrap().exists());
        }

        // Second delete is a no-op
        store.delete(&set);
    }

    #[test]
    fn test_delete_legacy_flat_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), "/images");
        let path = dir.path().join("old.jpg");
        std::fs::write(&path, b"legacy").unwrap();

        store.delete(&ImageReferenceSet::legacy("/images/old.jpg"));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_gif() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), "/images");
        let path = store.path_for(DerivativeKind::Main, "x.gif");
        store
            .write(&DynamicImage::new_rgb8(4, 4), &path, "gif", 90)
            .unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 4);
    }
}
