mod common;

use actix_web::{http::header, test};
use serde_json::Value;
use serial_test::serial;

use common::TestApp;
use tour_quote_api::models::account::UserRole;

const BOUNDARY: &str = "----tour-quote-boundary";

fn multipart_body(field: &str, file_name: &str, content: &str) -> String {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n{content}\r\n--{b}--\r\n",
        b = BOUNDARY,
        field = field,
        file_name = file_name,
        content = content,
    )
}

fn upload_request(test_app: &TestApp, file_name: &str, content: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/admin/backups")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Admin)))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body("backup_file", file_name, content))
}

#[actix_rt::test]
#[serial]
async fn test_admin_routes_without_auth() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/admin/cities").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_admin_routes_without_admin_role() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    for uri in ["/api/admin/cities", "/api/admin/backups"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Staff)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403, "{}", uri);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "insufficient permissions");
    }
}

#[actix_rt::test]
#[serial]
async fn test_list_backups_empty() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/admin/backups")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Admin)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_upload_validate_and_download_backup() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;
    let dump = "-- PostgreSQL database dump\nCREATE TABLE quotes ();\n";

    let resp = test::call_service(&app, upload_request(&test_app, "nightly.psql", dump).to_request()).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["file_name"], "nightly.psql");

    // Same name again is stored next to the first one.
    let resp = test::call_service(&app, upload_request(&test_app, "nightly.psql", dump).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["file_name"], "nightly_1.psql");
    assert!(test_app.backup_dir().join("nightly_1.psql").exists());

    let req = test::TestRequest::get()
        .uri("/api/admin/backups/nightly.psql/validate")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Admin)))
        .to_request();
    let check: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(check["valid"], true);
    assert_eq!(check["message"], "Backup file nightly.psql is ready to restore.");

    let req = test::TestRequest::get()
        .uri("/api/admin/backups/nightly.psql")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Admin)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("nightly.psql"));
    let bytes = test::read_body(resp).await;
    assert_eq!(bytes, dump.as_bytes());
}

#[actix_rt::test]
#[serial]
async fn test_upload_rejects_other_extensions() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let resp = test::call_service(&app, upload_request(&test_app, "notes.txt", "hello").to_request()).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["backup_file"], "Only .psql files are allowed.");
    assert!(!test_app.backup_dir().join("notes.txt").exists());
}

#[actix_rt::test]
#[serial]
async fn test_validate_rejects_non_dump() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let resp = test::call_service(&app, upload_request(&test_app, "broken.psql", "garbage").to_request()).await;
    assert_eq!(resp.status(), 201);

    let req = test::TestRequest::get()
        .uri("/api/admin/backups/broken.psql/validate")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Admin)))
        .to_request();
    let check: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(check["valid"], false);
}

#[actix_rt::test]
#[serial]
async fn test_download_missing_backup() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/admin/backups/missing.psql")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Admin)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
#[serial]
async fn test_prune_keeps_newest() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    for name in ["a.psql", "b.psql", "c.psql", "d.psql"] {
        let resp = test::call_service(&app, upload_request(&test_app, name, "-- dump\n").to_request()).await;
        assert_eq!(resp.status(), 201);
    }

    let req = test::TestRequest::post()
        .uri("/api/admin/backups/prune")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Admin)))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["kept"].as_array().unwrap().len(), 3);
    assert_eq!(report["deleted"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/admin/backups")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Admin)))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);
}
