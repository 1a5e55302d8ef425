mod common;

use actix_web::{http::header, test};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use serial_test::serial;

use common::TestApp;
use tour_quote_api::models::account::UserRole;

fn money(value: &Value) -> Decimal {
    let raw = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
    raw.parse().expect("decimal")
}

#[actix_rt::test]
#[serial]
async fn test_totals_preview() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/drafts/totals")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Staff)))
        .set_json(json!({
            "name": "Thailand Highlights",
            "commission_rate_hotel": "5",
            "commission_rate_services": "10",
            "days": [{
                "date": "2026-03-01",
                "services": [{"service": "65f000000000000000000004", "price_at_booking": "80", "quantity": 2}],
                "guideServices": [{"guide_service": "65f000000000000000000005", "price_at_booking": 40}]
            }, {
                "date": "",
                "services": [{"service": "65f000000000000000000006", "price_at_booking": ""}]
            }],
            "hotelCosts": [{"name": "Siam Palace", "room": "1", "nights": 2, "price": "100"}],
            "extraCosts": [{"item": "Visa", "amount": "35"}],
            "discounts": [{"item": "Loyalty", "amount": "10"}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let totals: Value = test::read_body_json(resp).await;
    assert_eq!(money(&totals["service_total"]), Decimal::from(160));
    assert_eq!(money(&totals["service_grand_total"]), Decimal::from(200));
    assert_eq!(money(&totals["hotel_grand_total"]), Decimal::from(200));
    assert_eq!(totals["total_room_nights"], 2);
    assert_eq!(money(&totals["commission_amount_hotel"]), Decimal::from(10));
    assert_eq!(money(&totals["commission_amount_services"]), Decimal::from(20));
    assert_eq!(money(&totals["grand_total_cost"]), Decimal::from(425));
}

#[actix_rt::test]
#[serial]
async fn test_totals_reject_oversized_hotel_lines() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    for line in [
        json!({"name": "Siam Palace", "room": 70000, "nights": 70000, "price": "1"}),
        json!({"name": "Siam Palace", "room": 2, "nights": 1, "price": "79228162514264337593543950335"}),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/drafts/totals")
            .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Staff)))
            .set_json(json!({ "hotelCosts": [line] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert!(body["errors"]["hotel_cost1"].is_string());
    }
}

#[actix_rt::test]
#[serial]
async fn test_insert_day_below_redates_following_days() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/drafts/days")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Staff)))
        .set_json(json!({
            "days": [
                {"date": "2026-03-01", "city": "65f000000000000000000002"},
                {"date": "2026-03-02", "city": "65f000000000000000000002"}
            ],
            "edit": {"op": "insert_below", "index": 0}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let dates: Vec<&str> = body["days"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2026-03-01", "2026-03-02", "2026-03-03"]);
    assert!(body["days"][1]["city"].is_null());
}

#[actix_rt::test]
#[serial]
async fn test_copy_day_drops_services() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/drafts/days")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Staff)))
        .set_json(json!({
            "days": [{
                "date": "2026-03-01",
                "city": "65f000000000000000000002",
                "hotel": "65f000000000000000000003",
                "services": [{"service": "65f000000000000000000004", "price_at_booking": 80}]
            }],
            "edit": {"op": "copy", "index": 0}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let copy = &body["days"][1];
    assert_eq!(copy["date"], "2026-03-02");
    assert_eq!(copy["hotel"], "65f000000000000000000003");
    assert_eq!(copy["services"].as_array().unwrap().len(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_edit_of_missing_day() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/drafts/days")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Staff)))
        .set_json(json!({
            "days": [{"date": "2026-03-01"}],
            "edit": {"op": "move", "from": 0, "to": 3}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Day 4 does not exist.");
}

#[actix_rt::test]
#[serial]
async fn test_unknown_edit_op() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/drafts/days")
        .insert_header((header::AUTHORIZATION, test_app.bearer(UserRole::Staff)))
        .set_json(json!({"days": [], "edit": {"op": "shuffle"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
}
