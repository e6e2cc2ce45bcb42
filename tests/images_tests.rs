
use reqwest::StatusCode;
use serde_json::Value;
use test_utils::*;

#[actix_rt::test]
async fn health_check_reports_model_and_endpoints() {
    let app = TestApp::spawn().await;

    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Image Analysis API is running");
    assert_eq!(body["ai_model_loaded"], true);
    assert_eq!(body["endpoints"]["upload"], "/upload");
    assert_eq!(body["endpoints"]["analyze"], "/analyze/{image_id}");
    assert_eq!(body["endpoints"]["metadata"], "/metadata/{image_id}");
}

#[actix_rt::test]
async fn health_check_without_model() {
    let app = TestApp::spawn_without_model().await;

    let body: Value = app.get("/").await.json().await.unwrap();

    assert_eq!(body["ai_model_loaded"], false);
}

#[actix_rt::test]
async fn upload_of_400x300_jpeg_returns_full_record() {
    let app = TestApp::spawn().await;

    let body = app.upload_ok(test_jpeg(400, 300), "test.jpg").await;

    let image_id = body["image_id"].as_str().unwrap();
    assert_eq!(body["original_filename"], "test.jpg");
    assert_eq!(body["saved_filename"], format!("{}.jpg", image_id));
    assert!(body["file_path"].as_str().unwrap().ends_with(&format!("{}.jpg", image_id)));
    assert_eq!(body["metadata"]["size"]["width"], 400);
    assert_eq!(body["metadata"]["size"]["height"], 300);
    assert_eq!(body["metadata"]["format"], "JPEG");
    assert_eq!(body["metadata"]["mode"], "RGB");
    assert!(body["metadata"]["exif"].as_object().unwrap().is_empty());
    assert_eq!(body["description"], "a light blue rectangle 400x300 beams 5");
    assert!(body["upload_time"].is_string());
}

#[actix_rt::test]
async fn upload_without_model_still_has_description() {
    let app = TestApp::spawn_without_model().await;

    let body = app.upload_ok(test_jpeg(400, 300), "test.jpg").await;

    let description = body["description"].as_str().unwrap();
    assert!(!description.is_empty());
    assert_eq!(
        description,
        "AI model not available. Using basic description based on filename."
    );
}

#[actix_rt::test]
async fn uploaded_image_resolves_on_every_endpoint() {
    let app = TestApp::spawn().await;
    let bytes = test_jpeg(120, 80);
    let upload = app.upload_ok(bytes.clone(), "round-trip.jpeg").await;
    let image_id = upload["image_id"].as_str().unwrap();

    let analyze = app.get(&format!("/analyze/{}", image_id)).await;
    assert_eq!(analyze.status(), StatusCode::OK);
    let analyze: Value = analyze.json().await.unwrap();
    assert_eq!(analyze["image_id"], image_id);
    assert_eq!(analyze["description"], upload["description"]);
    assert!(analyze["analysis_time"].is_string());

    let metadata = app.get(&format!("/metadata/{}", image_id)).await;
    assert_eq!(metadata.status(), StatusCode::OK);
    let metadata: Value = metadata.json().await.unwrap();
    assert_eq!(metadata["image_id"], image_id);
    assert_eq!(metadata["metadata"]["size"], upload["metadata"]["size"]);
    assert_eq!(metadata["metadata"]["format"], upload["metadata"]["format"]);

    let raw = app.get(&format!("/uploads/{}", image_id)).await;
    assert_eq!(raw.status(), StatusCode::OK);
    assert_eq!(raw.headers()["content-type"], "image/jpeg");
    assert_eq!(raw.bytes().await.unwrap().as_ref(), bytes.as_slice());
}

#[actix_rt::test]
async fn non_image_content_type_is_rejected_without_writing() {
    let app = TestApp::spawn().await;

    let response = app.upload(test_jpeg(10, 10), "photo.jpg", "text/plain").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "File must be an image");
    assert_eq!(app.stored_files(), 0);
    assert_eq!(app.image_count().await, 0);
}

#[actix_rt::test]
async fn unsupported_extension_is_rejected_for_any_content_type() {
    let app = TestApp::spawn().await;

    for (name, mime) in [("scan.tiff", "image/tiff"), ("vector.svg", "image/svg+xml"), ("photo", "image/jpeg")] {
        let response = app.upload(test_jpeg(10, 10), name, mime).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{name} should be rejected");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["detail"], "Unsupported image format");
    }
    assert_eq!(app.stored_files(), 0);
}

#[actix_rt::test]
async fn extension_check_ignores_case() {
    let app = TestApp::spawn().await;

    let body = app.upload_ok(test_png(20, 10), "SCREEN.PNG").await;

    let image_id = body["image_id"].as_str().unwrap();
    assert_eq!(body["saved_filename"], format!("{}.png", image_id));
    assert_eq!(body["metadata"]["format"], "PNG");
}

#[actix_rt::test]
async fn undecodable_upload_fails_and_leaves_no_file() {
    let app = TestApp::spawn().await;

    let response = app
        .upload(b"this is not a jpeg".to_vec(), "broken.jpg", "image/jpeg")
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().starts_with("Error processing image"));
    assert_eq!(app.stored_files(), 0);
    assert_eq!(app.image_count().await, 0);
}

#[actix_rt::test]
async fn listing_grows_by_one_per_successful_upload() {
    let app = TestApp::spawn().await;
    assert_eq!(app.image_count().await, 0);

    let first = app.upload_ok(test_jpeg(30, 30), "one.jpg").await;
    assert_eq!(app.image_count().await, 1);

    app.upload(b"garbage".to_vec(), "bad.jpg", "image/jpeg").await;
    assert_eq!(app.image_count().await, 1);

    app.upload_ok(test_jpeg(30, 30), "two.jpg").await;

    let body: Value = app.get("/images").await.json().await.unwrap();
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);

    let entry = images
        .iter()
        .find(|i| i["image_id"] == first["image_id"])
        .expect("first upload missing from listing");
    assert_eq!(entry["filename"], first["saved_filename"]);
    assert_eq!(entry["size"], first["metadata"]["file_size"]);
    assert!(entry["created"].is_string());
}

#[actix_rt::test]
async fn unknown_identifier_is_404_everywhere() {
    let app = TestApp::spawn().await;
    app.upload_ok(test_jpeg(10, 10), "present.jpg").await;

    for path in [
        "/analyze/00000000-0000-0000-0000-000000000000",
        "/metadata/00000000-0000-0000-0000-000000000000",
        "/uploads/00000000-0000-0000-0000-000000000000",
        "/uploads/not-a-uuid",
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "not_found");
    }
}

#[actix_rt::test]
async fn deleted_upload_is_no_longer_served() {
    let app = TestApp::spawn().await;
    let body = app.upload_ok(test_jpeg(10, 10), "gone.jpg").await;
    let image_id = body["image_id"].as_str().unwrap();

    std::fs::remove_file(app.upload_dir.path().join(format!("{}.jpg", image_id))).unwrap();

    let response = app.get(&format!("/uploads/{}", image_id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn upload_without_file_part_is_bad_request() {
    let app = TestApp::spawn().await;

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let response = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn unknown_route_returns_json_404() {
    let app = TestApp::spawn().await;

    let response = app.get("/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[actix_rt::test]
async fn cross_origin_requests_are_allowed() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/images"))
        .header("Origin", "http://x.test")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let allowed = response.headers()["access-control-allow-origin"].to_str().unwrap();
    assert!(allowed == "http://x.test" || allowed == "*", "unexpected origin {allowed}");
}

#[actix_rt::test]
async fn cors_preflight_for_upload_succeeds() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .request(reqwest::Method::OPTIONS, app.url("/upload"))
        .header("Origin", "http://x.test")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("access-control-allow-origin"));
}
