/// Media handler - serves uploaded images from the media root
use actix_web::{web, HttpResponse};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Reject anything that could escape the media root.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && !key.split('/').any(|part| part.is_empty() || part == "." || part == "..")
}

fn content_type_for(key: &str) -> mime::Mime {
    match key
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("png") => mime::IMAGE_PNG,
        Some("gif") => mime::IMAGE_GIF,
        Some("webp") => "image/webp"
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

pub async fn serve(
    config: web::Data<Config>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let key = path.into_inner();
    if !is_safe_key(&key) {
        return Err(AppError::NotFound(format!("media {}", key)));
    }

    let full_path = std::path::Path::new(&config.media.root).join(&key);
    let data = tokio::fs::read(&full_path)
        .await
        .map_err(|_| AppError::NotFound(format!("media {}", key)))?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&key))
        .body(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(!is_safe_key("../etc/passwd"));
        assert!(!is_safe_key("posts/../../secret"));
        assert!(!is_safe_key("/absolute"));
        assert!(!is_safe_key("posts//double"));
        assert!(!is_safe_key(""));
        assert!(is_safe_key("posts/a1b2.jpeg"));
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for("posts/x.jpeg"), mime::IMAGE_JPEG);
        assert_eq!(content_type_for("posts/x.JPG"), mime::IMAGE_JPEG);
        assert_eq!(content_type_for("posts/x.png"), mime::IMAGE_PNG);
        assert_eq!(content_type_for("posts/x.webp").essence_str(), "image/webp");
        assert_eq!(
            content_type_for("posts/x.bin"),
            mime::APPLICATION_OCTET_STREAM
        );
    }
}
