//! Product image storage on local disk.
//!
//! Files are named `{product_id}-{batch}-{n}.{ext}` (n from 1) inside
//! `UPLOAD_DIR` and served back under `/uploads/`. Each upload gets a fresh
//! batch token, so files referenced by committed image rows are never
//! overwritten; replaced files are removed once the new rows are committed.

use std::path::{Path, PathBuf};

use uuid::Uuid;
use vegi_shop_core::ProductId;

/// URL prefix the upload directory is mounted at.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Extensions accepted for product images. Anything else is stored as `jpg`.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif"];

/// An uploaded image held in memory until the product row exists.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// File extension from the original name, else the MIME subtype.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str());
        let from_mime = self
            .content_type
            .as_deref()
            .and_then(|mime| mime.strip_prefix("image/"));

        from_name
            .into_iter()
            .chain(from_mime)
            .find_map(|candidate| {
                IMAGE_EXTENSIONS
                    .iter()
                    .find(|ext| ext.eq_ignore_ascii_case(candidate))
                    .copied()
            })
            .unwrap_or("jpg")
    }
}

/// File name for the `n`th image (1-based) of an upload batch.
#[must_use]
pub fn image_file_name(product_id: ProductId, batch: &str, n: usize, extension: &str) -> String {
    format!("{product_id}-{batch}-{n}.{extension}")
}

/// Write every image to `dir` and return their public URLs in order.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created or a file
/// cannot be written.
pub async fn store_images(
    dir: &Path,
    product_id: ProductId,
    images: &[ImageUpload],
) -> std::io::Result<Vec<String>> {
    tokio::fs::create_dir_all(dir).await?;

    let batch = Uuid::new_v4().simple().to_string();
    let mut urls = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let name = image_file_name(product_id, &batch, index + 1, image.extension());
        let path: PathBuf = dir.join(&name);
        if let Err(err) = tokio::fs::write(&path, &image.bytes).await {
            remove_images(dir, &urls).await;
            return Err(err);
        }
        urls.push(format!("{UPLOADS_URL_PREFIX}/{name}"));
    }

    tracing::debug!(product_id = %product_id, count = urls.len(), "Product images stored");
    Ok(urls)
}

/// Delete the files behind locally stored image URLs. URLs that do not
/// point into the upload directory (seeded remote images) are skipped, and
/// failures are logged rather than returned.
pub async fn remove_images(dir: &Path, urls: &[String]) {
    for url in urls {
        let Some(name) = local_file_name(url) else {
            continue;
        };
        match tokio::fs::remove_file(dir.join(name)).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(error = %err, %url, "Failed to remove product image"),
        }
    }
}

/// The file name of an `/uploads/{name}` URL, if it names a plain file.
fn local_file_name(url: &str) -> Option<&str> {
    url.strip_prefix(UPLOADS_URL_PREFIX)?
        .strip_prefix('/')
        .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn upload(file_name: Option<&str>, content_type: Option<&str>) -> ImageUpload {
        ImageUpload {
            file_name: file_name.map(String::from),
            content_type: content_type.map(String::from),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[test]
    fn test_extension_prefers_file_name() {
        assert_eq!(upload(Some("kale.PNG"), Some("image/jpeg")).extension(), "png");
        assert_eq!(upload(Some("kale"), Some("image/webp")).extension(), "webp");
        assert_eq!(upload(Some("kale.exe"), None).extension(), "jpg");
        assert_eq!(upload(None, None).extension(), "jpg");
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("vegi-uploads-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_image_file_name() {
        assert_eq!(image_file_name(ProductId::new(12), "a1b2c3d4", 1, "png"), "12-a1b2c3d4-1.png");
    }

    #[test]
    fn test_local_file_name() {
        assert_eq!(local_file_name("/uploads/3-ab-1.png"), Some("3-ab-1.png"));
        assert_eq!(local_file_name("https://images.example.com/kale.jpg"), None);
        assert_eq!(local_file_name("/uploads/../secrets"), None);
        assert_eq!(local_file_name("/uploads/a/b.png"), None);
        assert_eq!(local_file_name("/uploads/"), None);
    }

    #[tokio::test]
    async fn test_store_images_writes_files() {
        let dir = temp_dir();
        let images = vec![upload(Some("a.png"), None), upload(Some("b.jpg"), None)];

        let urls = store_images(&dir, ProductId::new(3), &images).await.unwrap();

        assert_eq!(urls.len(), 2);
        assert!(urls[0].starts_with("/uploads/3-") && urls[0].ends_with("-1.png"), "{urls:?}");
        assert!(urls[1].ends_with("-2.jpg"), "{urls:?}");
        let second = local_file_name(&urls[1]).unwrap();
        assert_eq!(tokio::fs::read(dir.join(second)).await.unwrap(), vec![0xFF, 0xD8, 0xFF]);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_replacement_keeps_committed_files_until_removed() {
        let dir = temp_dir();
        let id = ProductId::new(8);

        let old = store_images(&dir, id, &[upload(Some("a.png"), None)]).await.unwrap();
        let mut replacement = upload(Some("a.png"), None);
        replacement.bytes = vec![1, 2, 3];
        let new = store_images(&dir, id, &[replacement]).await.unwrap();

        // Same product and position, different file; the old bytes are intact
        assert_ne!(old, new);
        let old_path = dir.join(local_file_name(&old[0]).unwrap());
        assert_eq!(tokio::fs::read(&old_path).await.unwrap(), vec![0xFF, 0xD8, 0xFF]);

        remove_images(&dir, &old).await;
        assert!(!old_path.exists());
        let new_path = dir.join(local_file_name(&new[0]).unwrap());
        assert_eq!(tokio::fs::read(&new_path).await.unwrap(), vec![1, 2, 3]);

        // Remote URLs and already-removed files are ignored
        remove_images(&dir, &["https://images.example.com/kale.jpg".to_owned()]).await;
        remove_images(&dir, &old).await;
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
