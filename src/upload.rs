//! Profile image uploads.
//!
//! Images are written to the upload directory and served back under [endpoints::UPLOADS].

use std::path::PathBuf;

use axum::{
    Json,
    extract::{FromRef, Multipart, State, multipart::Field},
    http::{HeaderMap, header},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error, endpoints};

/// The name of the multipart form field that holds the image.
pub const IMAGE_FIELD: &str = "image";

const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// The state needed for uploading images.
#[derive(Debug, Clone)]
pub struct UploadState {
    /// The directory that uploaded images are saved to.
    pub upload_dir: PathBuf,
}

impl FromRef<AppState> for UploadState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            upload_dir: state.upload_dir.clone(),
        }
    }
}

/// The response to a successful upload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// The public URL of the uploaded image.
    pub image_url: String,
}

/// A route handler for uploading a single image in the multipart field "image".
///
/// The image is saved as `<unix millis>-<original file name>` so that uploads
/// with the same name do not overwrite each other.
pub async fn upload_image(
    State(state): State<UploadState>,
    headers: HeaderMap,
    WithRejection(mut multipart, _): WithRejection<Multipart, Error>,
) -> Result<Json<UploadResponse>, Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = save_image(field, &state.upload_dir).await?;
        let host = headers
            .get(header::HOST)
            .and_then(|host| host.to_str().ok())
            .unwrap_or("localhost");

        return Ok(Json(UploadResponse {
            image_url: format!("http://{host}{}/{file_name}", endpoints::UPLOADS),
        }));
    }

    Err(Error::NoFileUploaded)
}

async fn save_image(field: Field<'_>, upload_dir: &std::path::Path) -> Result<String, Error> {
    if !field
        .content_type()
        .is_some_and(|content_type| ALLOWED_CONTENT_TYPES.contains(&content_type))
    {
        return Err(Error::UnsupportedImageType);
    }

    let original_name = field
        .file_name()
        .map(sanitize_file_name)
        .filter(|name| !name.is_empty())
        .ok_or(Error::NoFileUploaded)?;

    let data = field.bytes().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError(error.body_text())
    })?;

    let timestamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let file_name = format!("{timestamp}-{original_name}");

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|error| Error::FileWriteError(error.to_string()))?;
    tokio::fs::write(upload_dir.join(&file_name), &data)
        .await
        .map_err(|error| Error::FileWriteError(error.to_string()))?;

    tracing::debug!("Saved upload '{}' that is {} bytes", file_name, data.len());

    Ok(file_name)
}

/// Keep only the final path component of `file_name` and replace characters
/// that are not safe in a URL path.
fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_owned()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        build_router, endpoints,
        test_utils::get_test_state,
        upload::{UploadResponse, sanitize_file_name},
    };

    const BOUNDARY: &str = "MY_BOUNDARY123456789";

    fn multipart_body(field_name: &str, file_name: &str, content_type: &str, data: &str) -> Vec<u8> {
        [
            format!("--{BOUNDARY}"),
            format!("Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{file_name}\""),
            format!("Content-Type: {content_type}"),
            String::new(),
            data.to_owned(),
            format!("--{BOUNDARY}--"),
        ]
        .join("\r\n")
        .into_bytes()
    }

    fn get_server(upload_dir: &std::path::Path) -> TestServer {
        TestServer::try_new(build_router(get_test_state(upload_dir)))
            .expect("Could not create test server.")
    }

    async fn post_upload(server: &TestServer, body: Vec<u8>) -> axum_test::TestResponse {
        server
            .post(endpoints::UPLOAD_IMAGE)
            .content_type(&format!("multipart/form-data; boundary={BOUNDARY}"))
            .bytes(body.into())
            .await
    }

    #[tokio::test]
    async fn upload_saves_image_and_serves_it() {
        let upload_dir = tempfile::tempdir().unwrap();
        let server = get_server(upload_dir.path());

        let response = post_upload(
            &server,
            multipart_body("image", "avatar.png", "image/png", "not really a png"),
        )
        .await;

        response.assert_status_ok();
        let image_url = response.json::<UploadResponse>().image_url;
        let (_, file_name) = image_url
            .rsplit_once("/uploads/")
            .expect("image url should point to the uploads route");
        assert!(file_name.ends_with("-avatar.png"));
        assert_eq!(
            std::fs::read_to_string(upload_dir.path().join(file_name)).unwrap(),
            "not really a png"
        );

        server
            .get(&format!("{}/{file_name}", endpoints::UPLOADS))
            .await
            .assert_text("not really a png");
    }

    #[tokio::test]
    async fn upload_rejects_other_file_types() {
        let upload_dir = tempfile::tempdir().unwrap();
        let server = get_server(upload_dir.path());

        let response = post_upload(
            &server,
            multipart_body("image", "notes.txt", "text/plain", "hello"),
        )
        .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "message": "Only .jpeg, .jpg, and .png formats are allowed"
        }));
    }

    #[tokio::test]
    async fn upload_without_image_field_fails() {
        let upload_dir = tempfile::tempdir().unwrap();
        let server = get_server(upload_dir.path());

        let response = post_upload(
            &server,
            multipart_body("avatar", "avatar.png", "image/png", "data"),
        )
        .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "message": "No file uploaded" }));
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\photo.jpg"), "photo.jpg");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_file_name(".hidden.png"), "hidden.png");
    }
}
