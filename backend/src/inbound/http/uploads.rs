//! Serves photos stored by the filesystem asset host.

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::outbound::assets::content_type_for;

/// Stream a stored photo by file name.
#[utoipa::path(
    get,
    path = "/uploads/{name}",
    params(("name" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["uploads"],
    operation_id = "getUpload",
    security([])
)]
#[get("/uploads/{name}")]
pub async fn get_upload(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let name = path.into_inner();
    let Some(uploads) = state.uploads.as_ref() else {
        return Err(Error::not_found("uploads are not served by this deployment"));
    };
    let bytes = uploads
        .read(&name)
        .await
        .map_err(|error| Error::internal(format!("failed to read upload: {error}")))?
        .ok_or_else(|| Error::not_found(format!("upload {name} not found")))?;
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&name))
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImageUpload;
    use crate::domain::ports::AssetHost;
    use crate::inbound::http::test_utils::{TestPorts, test_state};
    use crate::outbound::assets::FilesystemAssetHost;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use url::Url;

    async fn fetch(state: HttpState, uri: &str) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(get_upload),
        )
        .await;
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await
    }

    #[actix_web::test]
    async fn serves_stored_photo_with_its_content_type() {
        let dir = tempfile::tempdir().expect("temp dir");
        let host = FilesystemAssetHost::open(
            dir.path(),
            Url::parse("http://localhost:8080/uploads").expect("url"),
        )
        .expect("open host");
        let image = ImageUpload::new(0, None, "image/png", b"png-bytes".to_vec()).expect("image");
        let stored = host.store(&image).await.expect("stored");
        let name = stored
            .url
            .rsplit('/')
            .next()
            .expect("file name")
            .to_owned();

        let response = fetch(
            test_state(TestPorts::default()).with_uploads(host),
            &format!("/uploads/{name}"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("image/png")
        );
        assert_eq!(actix_test::read_body(response).await.as_ref(), b"png-bytes");
    }

    #[actix_web::test]
    async fn unknown_names_are_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let host = FilesystemAssetHost::open(
            dir.path(),
            Url::parse("http://localhost:8080/uploads/").expect("url"),
        )
        .expect("open host");

        let response = fetch(
            test_state(TestPorts::default()).with_uploads(host),
            "/uploads/missing.png",
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn disabled_without_filesystem_host() {
        let response = fetch(test_state(TestPorts::default()), "/uploads/a.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
