//! Upload orchestration: validate, decode, derive, write, roll back on failure.

use std::io::Write;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use storefront_common::paths::normalized_image_extension;
use storefront_common::ImageReferenceSet;
use uuid::Uuid;

use super::storage::{DerivativeKind, ImageStore};
use super::transform::{self, Geometry};
use super::ImageError;

/// One derivative produced per upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub kind: DerivativeKind,
    pub geometry: Geometry,
    /// JPEG quality (1-100).
    pub quality: u8,
}

/// Derivatives produced for every upload, in write order.
pub const VARIANTS: [Variant; 3] = [
    Variant {
        kind: DerivativeKind::Thumbnail,
        geometry: Geometry::Square(200),
        quality: 85,
    },
    Variant {
        kind: DerivativeKind::Main,
        geometry: Geometry::Fit {
            width: 600,
            height: 400,
        },
        quality: 90,
    },
    Variant {
        kind: DerivativeKind::Original,
        geometry: Geometry::Fit {
            width: 800,
            height: 600,
        },
        quality: 95,
    },
];

/// Produces and removes the three derivatives of product uploads.
///
/// Stateless apart from the store configuration; concurrent calls write to
/// disjoint UUID-named files.
#[derive(Debug, Clone)]
pub struct ImagePipeline {
    store: ImageStore,
    variants: [Variant; 3],
}

impl ImagePipeline {
    pub fn new(store: ImageStore) -> Self {
        Self {
            store,
            variants: VARIANTS,
        }
    }

    /// Pipeline with a custom variant table.
    #[cfg(test)]
    pub(crate) fn with_variants(store: ImageStore, variants: [Variant; 3]) -> Self {
        Self { store, variants }
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Turn an upload into three stored derivatives.
    ///
    /// The extension of `filename` decides acceptance and the output format.
    /// Either all three files are written or none are left behind.
    pub fn process(&self, data: &[u8], filename: &str) -> Result<ImageReferenceSet, ImageError> {
        let ext = normalized_image_extension(filename).ok_or_else(|| {
            ImageError::UnsupportedFormat {
                filename: filename.to_string(),
            }
        })?;
        let base = format!("{}.{}", Uuid::new_v4(), ext);
        tracing::debug!("Processing upload {} ({} bytes) as {}", filename, data.len(), base);

        // Removed when dropped, on every exit path
        let upload = self.materialize(data)?;
        let source = decode(upload.path())?;

        let mut written = Vec::with_capacity(self.variants.len());
        match self.write_variants(&source, &base, ext, &mut written) {
            Ok(images) => Ok(images),
            Err(e) => {
                tracing::warn!(
                    "Processing {} failed after {} file(s) were written: {}",
                    filename,
                    written.len(),
                    e
                );
                rollback(&written);
                Err(match e {
                    ImageError::Processing(_) => e,
                    other => ImageError::Processing(other.to_string()),
                })
            }
        }
    }

    /// Run the pipeline on a local file, using its name as the declared filename.
    pub fn process_file(&self, path: &Path) -> Result<ImageReferenceSet, ImageError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if normalized_image_extension(&filename).is_none() {
            return Err(ImageError::UnsupportedFormat { filename });
        }
        let data = std::fs::read(path)?;
        self.process(&data, &filename)
    }

    /// Remove previously stored derivatives. Never fails.
    pub fn delete(&self, images: &ImageReferenceSet) {
        self.store.delete(images);
    }

    fn materialize(&self, data: &[u8]) -> Result<tempfile::NamedTempFile, ImageError> {
        std::fs::create_dir_all(self.store.root())?;
        let mut file = tempfile::Builder::new()
            .prefix(".upload-")
            .tempfile_in(self.store.root())?;
        file.write_all(data)?;
        file.flush()?;
        Ok(file)
    }

    fn write_variants(
        &self,
        source: &DynamicImage,
        base: &str,
        ext: &str,
        written: &mut Vec<PathBuf>,
    ) -> Result<ImageReferenceSet, ImageError> {
        let mut locations = Vec::with_capacity(self.variants.len());
        for variant in &self.variants {
            let derived = transform::render(source, variant.geometry)?;
            let path = self.store.path_for(variant.kind, base);
            // Recorded before writing so a half-written file is rolled back too
            written.push(path.clone());
            self.store.write(&derived, &path, ext, variant.quality)?;
            locations.push(self.store.location_for(variant.kind, base));
        }

        let mut locations = locations.into_iter();
        match (locations.next(), locations.next(), locations.next()) {
            (Some(thumbnail), Some(main), Some(original)) => Ok(ImageReferenceSet {
                thumbnail,
                main,
                original,
            }),
            _ => Err(ImageError::Processing(
                "pipeline produced fewer than three derivatives".to_string(),
            )),
        }
    }
}

fn decode(path: &Path) -> Result<DynamicImage, ImageError> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    if img.width() == 0 || img.height() == 0 {
        return Err(ImageError::Processing("image has no pixels".to_string()));
    }
    Ok(transform::normalize_color(img))
}

fn rollback(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!("Rolled back {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::debug!("Rollback of {} failed: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));
        encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
    }

    fn pipeline(dir: &Path) -> ImagePipeline {
        let store = ImageStore::new(dir, "/images");
        store.ensure_layout().unwrap();
        ImagePipeline::new(store)
    }

    fn stored_files(dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for kind in DerivativeKind::ALL {
            for entry in std::fs::read_dir(dir.join(kind.bucket())).unwrap() {
                files.push(entry.unwrap().path());
            }
        }
        files
    }

    fn dimensions(pipeline: &ImagePipeline, location: &str) -> (u32, u32) {
        let path = pipeline.store().resolve(location).unwrap();
        let img = image::open(path).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_process_landscape_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let images = pipeline.process(&jpeg(400, 300), "photo.JPG").unwrap();

        assert!(images.thumbnail.starts_with("/images/thumbnails/"));
        assert!(images.main.starts_with("/images/main/"));
        assert!(images.original.starts_with("/images/original/"));
        assert!(images.iter().all(|l| l.ends_with(".jpg")));

        let base = images.thumbnail.rsplit('/').next().unwrap();
        assert!(images.iter().all(|l| l.ends_with(base)));

        assert_eq!(dimensions(&pipeline, &images.thumbnail), (200, 200));
        assert_eq!(dimensions(&pipeline, &images.main), (533, 400));
        assert_eq!(dimensions(&pipeline, &images.original), (800, 600));
    }

    #[test]
    fn test_process_normalizes_jpeg_extension() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        let images = pipeline.process(&jpeg(50, 80), "scan.jpeg").unwrap();
        assert!(images.main.ends_with(".jpg"));
    }

    #[test]
    fn test_process_png_with_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        let img = RgbaImage::from_pixel(300, 500, Rgba([0, 0, 255, 40]));
        let data = encode(DynamicImage::ImageRgba8(img), ImageFormat::Png);

        let images = pipeline.process(&data, "logo.PNG").unwrap();
        assert!(images.main.ends_with(".png"));
        assert_eq!(dimensions(&pipeline, &images.thumbnail), (200, 200));
        assert_eq!(dimensions(&pipeline, &images.main), (240, 400));

        let decoded = image::open(pipeline.store().resolve(&images.main).unwrap()).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_process_every_supported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        let data = jpeg(40, 30);
        for name in ["a.jpg", "a.JPEG", "a.png", "a.gif", "a.webp"] {
            let images = pipeline.process(&data, name).unwrap();
            assert_eq!(images.iter().count(), 3, "{}", name);
            for location in images.iter() {
                assert!(pipeline.store().resolve(location).unwrap().exists());
            }
        }
        assert_eq!(stored_files(dir.path()).len(), 15);
    }

    #[test]
    fn test_unsupported_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let err = pipeline.process(&jpeg(40, 30), "art.bmp").unwrap_err();
        assert_matches!(err, ImageError::UnsupportedFormat { ref filename } if filename == "art.bmp");

        let err = pipeline.process(&jpeg(40, 30), "noextension").unwrap_err();
        assert_matches!(err, ImageError::UnsupportedFormat { .. });

        assert!(stored_files(dir.path()).is_empty());
    }

    #[test]
    fn test_undecodable_upload_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let err = pipeline.process(b"definitely not an image", "x.png").unwrap_err();
        assert_matches!(err, ImageError::Processing(_));
        assert!(stored_files(dir.path()).is_empty());
    }

    #[test]
    fn test_temporary_upload_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        pipeline.process(&jpeg(40, 30), "x.jpg").unwrap();
        let _ = pipeline.process(b"garbage", "y.jpg");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().unwrap().is_file())
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_failure_after_thumbnail_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), "/images");
        store.ensure_layout().unwrap();

        let mut variants = VARIANTS;
        variants[1].geometry = Geometry::Fit {
            width: 0,
            height: 0,
        };
        let pipeline = ImagePipeline::with_variants(store, variants);

        let err = pipeline.process(&jpeg(400, 300), "photo.jpg").unwrap_err();
        assert_matches!(err, ImageError::Processing(_));
        assert!(stored_files(dir.path()).is_empty());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let images = pipeline.process(&jpeg(40, 30), "x.jpg").unwrap();
        assert_eq!(stored_files(dir.path()).len(), 3);

        pipeline.delete(&images);
        assert!(stored_files(dir.path()).is_empty());
        pipeline.delete(&images);
    }

    #[test]
    fn test_process_file() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir.path().join("images"));
        let source = dir.path().join("Photo.Jpeg");
        std::fs::write(&source, jpeg(120, 90)).unwrap();

        let images = pipeline.process_file(&source).unwrap();
        assert!(images.original.ends_with(".jpg"));

        let err = pipeline.process_file(&dir.path().join("notes.txt")).unwrap_err();
        assert_matches!(err, ImageError::UnsupportedFormat { .. });
    }
}
