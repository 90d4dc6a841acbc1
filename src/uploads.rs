use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// An image received from a multipart form, not yet written to disk.
#[derive(Debug)]
pub struct UploadedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Write the image under `dir` with a random name and return its public path.
pub async fn store_image(dir: &Path, image: UploadedImage, limit: usize) -> AppResult<String> {
    let ext = extension_for(&image.content_type).ok_or_else(|| {
        AppError::BadRequest(format!("Unsupported image type {}", image.content_type))
    })?;
    if image.bytes.is_empty() {
        return Err(AppError::BadRequest("Image is empty".into()));
    }
    if image.bytes.len() > limit {
        return Err(AppError::BadRequest(format!(
            "Image is larger than {limit} bytes"
        )));
    }

    fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let file_name = format!("{}.{ext}", Uuid::new_v4());
    fs::write(dir.join(&file_name), &image.bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::debug!(file = %file_name, size = image.bytes.len(), "stored image");
    Ok(format!("{PUBLIC_PREFIX}/{file_name}"))
}

/// Best-effort removal of a previously stored image.
pub async fn remove_image(dir: &Path, public_path: &str) {
    let Some(path) = local_path(dir, public_path) else {
        return;
    };
    if let Err(err) = fs::remove_file(&path).await {
        tracing::warn!(error = %err, path = %path.display(), "failed to remove image");
    }
}

/// Remove a just-stored image when the row meant to reference it was not saved.
pub async fn discard_on_error<T, E>(
    dir: &Path,
    public_path: Option<&str>,
    saved: Result<T, E>,
) -> Result<T, E> {
    if let Some(public_path) = public_path.filter(|_| saved.is_err()) {
        remove_image(dir, public_path).await;
    }
    saved
}

/// Map `/uploads/<file>` back to `<dir>/<file>`. Anything that could escape
/// the upload directory maps to `None`.
fn local_path(dir: &Path, public_path: &str) -> Option<PathBuf> {
    let name = public_path
        .strip_prefix(PUBLIC_PREFIX)?
        .strip_prefix('/')?;
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
        return None;
    }
    Some(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("restaurant-api-uploads-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn stores_png_and_returns_public_path() {
        let dir = scratch_dir();
        let path = store_image(
            &dir,
            UploadedImage {
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            },
            1024,
        )
        .await
        .unwrap();

        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".png"));
        let on_disk = local_path(&dir, &path).unwrap();
        assert_eq!(fs::read(&on_disk).await.unwrap(), vec![1, 2, 3]);

        remove_image(&dir, &path).await;
        assert!(!on_disk.exists());
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn unsaved_rows_do_not_keep_their_image() {
        let dir = scratch_dir();
        let png = || UploadedImage {
            content_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        };

        let kept = store_image(&dir, png(), 1024).await.unwrap();
        let saved: Result<(), String> = Ok(());
        assert!(discard_on_error(&dir, Some(&kept), saved).await.is_ok());
        assert!(local_path(&dir, &kept).unwrap().exists());

        let dropped = store_image(&dir, png(), 1024).await.unwrap();
        let failed: Result<(), String> = Err("insert failed".into());
        assert!(discard_on_error(&dir, Some(&dropped), failed).await.is_err());
        assert!(!local_path(&dir, &dropped).unwrap().exists());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn rejects_unsupported_and_oversized_files() {
        let dir = scratch_dir();
        let gif = UploadedImage {
            content_type: "image/gif".into(),
            bytes: vec![0; 4],
        };
        assert!(matches!(
            store_image(&dir, gif, 1024).await,
            Err(AppError::BadRequest(_))
        ));

        let big = UploadedImage {
            content_type: "image/jpeg".into(),
            bytes: vec![0; 16],
        };
        assert!(matches!(
            store_image(&dir, big, 8).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn public_paths_cannot_escape_the_directory() {
        let dir = Path::new("uploads");
        assert_eq!(
            local_path(dir, "/uploads/a.png"),
            Some(dir.join("a.png"))
        );
        assert_eq!(local_path(dir, "/uploads/../secret"), None);
        assert_eq!(local_path(dir, "/elsewhere/a.png"), None);
        assert_eq!(local_path(dir, "/uploads/"), None);
    }
}
