use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use snrd_dispatch::api::rest::router;
use snrd_dispatch::engine::planner::run_planner;
use snrd_dispatch::state::AppState;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

fn setup() -> (axum::Router, mpsc::Receiver<Uuid>) {
    let (state, rx) = AppState::new(1024, 1024);
    (router(Arc::new(state)), rx)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn create_client(app: &axum::Router, name: &str) -> Value {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/clients",
            json!({
                "name": name,
                "contact_person": "P. Petrov",
                "phone": "+7 900 000-00-00",
                "email": "contact@example.com"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn create_service_object(app: &axum::Router, client_id: &str) -> Value {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/service-objects",
            json!({
                "name": "Northgate mall",
                "kind": "Location",
                "client_id": client_id,
                "address": "12 Industrial road",
                "coordinates": { "lat": 55.7558, "lng": 37.6173 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn create_application(
    app: &axum::Router,
    client_id: &str,
    object_id: &str,
    priority: &str,
) -> Value {
    let deadline = Utc::now() + Duration::days(3);
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/applications",
            json!({
                "number": "APP-0001",
                "client_id": client_id,
                "object_id": object_id,
                "service_type": "Ventilation",
                "territory": "North",
                "priority": priority,
                "description": "Air handler makes grinding noise",
                "sla_deadline": deadline.to_rfc3339()
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn create_employee(app: &axum::Router, body: Value) -> Value {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/employees", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _rx) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["clients"], 0);
    assert_eq!(body["employees"], 0);
    assert_eq!(body["applications"], 0);
    assert_eq!(body["work_orders"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _rx) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("applications_in_queue"));
}

#[tokio::test]
async fn create_client_empty_name_blocks_save() {
    let (app, _rx) = setup();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/clients",
            json!({ "name": "  " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["fields"][0]["field"], "name");
    assert!(
        body["fields"][0]["message"]
            .as_str()
            .unwrap()
            .contains("required")
    );

    // No record was added.
    let response = app.oneshot(get_request("/clients")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn client_crud_roundtrip() {
    let (app, _rx) = setup();

    let client = create_client(&app, "Arctic Retail").await;
    let id = client["id"].as_str().unwrap().to_string();
    assert_eq!(client["contract"], "Active");

    let res = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/clients/{id}"),
            json!({
                "name": "Arctic Retail Group",
                "contact_person": "P. Petrov",
                "contract": "Renewal"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await;
    assert_eq!(updated["name"], "Arctic Retail Group");
    assert_eq!(updated["contract"], "Renewal");

    let res = app
        .clone()
        .oneshot(delete_request(&format!("/clients/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.oneshot(get_request("/clients")).await.unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn client_list_supports_substring_search() {
    let (app, _rx) = setup();
    create_client(&app, "Arctic Retail").await;
    create_client(&app, "Borealis Logistics").await;

    let res = app
        .clone()
        .oneshot(get_request("/clients?q=arctic"))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Arctic Retail");

    let res = app.oneshot(get_request("/clients?q=zzz")).await.unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_employee_requires_name_and_service_types() {
    let (app, _rx) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/employees",
            json!({
                "full_name": "",
                "service_types": [],
                "skill_level": "Generalist"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"full_name"));
    assert!(fields.contains(&"service_types"));
}

#[tokio::test]
async fn create_application_rejects_unknown_client() {
    let (app, _rx) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/applications",
            json!({
                "number": "APP-0001",
                "client_id": Uuid::new_v4(),
                "object_id": Uuid::new_v4(),
                "service_type": "Ventilation",
                "territory": "North",
                "priority": "Medium",
                "description": "anything",
                "sla_deadline": Utc::now().to_rfc3339()
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn application_list_filters_and_carries_sla_countdown() {
    let (app, _rx) = setup();
    let client = create_client(&app, "Arctic Retail").await;
    let object = create_service_object(&app, client["id"].as_str().unwrap()).await;
    create_application(
        &app,
        client["id"].as_str().unwrap(),
        object["id"].as_str().unwrap(),
        "Medium",
    )
    .await;

    let res = app.clone().oneshot(get_request("/applications")).await.unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "New");
    assert_eq!(body[0]["sla"]["band"], "Normal");
    assert!(
        body[0]["sla"]["label"]
            .as_str()
            .unwrap()
            .contains("d left")
    );

    // Substring search over number and description.
    let res = app
        .clone()
        .oneshot(get_request("/applications?q=grinding"))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // A status value not present in the data yields an empty list.
    let res = app
        .clone()
        .oneshot(get_request("/applications?status=Suspended"))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let res = app
        .oneshot(get_request("/applications?priority=Emergency"))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn get_nonexistent_application_returns_404() {
    let (app, _rx) = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/applications/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn candidates_are_ranked_descending_with_reasons() {
    let (app, _rx) = setup();
    let client = create_client(&app, "Arctic Retail").await;
    let object = create_service_object(&app, client["id"].as_str().unwrap()).await;
    let application = create_application(
        &app,
        client["id"].as_str().unwrap(),
        object["id"].as_str().unwrap(),
        "High",
    )
    .await;
    let application_id = application["id"].as_str().unwrap();

    // Full match next to the site: clamps at 100.
    create_employee(
        &app,
        json!({
            "full_name": "Top Fit",
            "position": "HVAC engineer",
            "service_types": ["Ventilation"],
            "territories": ["North"],
            "skill_level": "Specialist",
            "status": "OnShift",
            "location": { "lat": 55.7600, "lng": 37.6200 }
        }),
    )
    .await;

    // Service type only, on shift, no known location: 50 + 30 + 10 = 90.
    create_employee(
        &app,
        json!({
            "full_name": "Mid Fit",
            "service_types": ["Ventilation"],
            "skill_level": "Generalist",
            "status": "OnShift"
        }),
    )
    .await;

    // No tags, off shift, no location: base 50.
    create_employee(
        &app,
        json!({
            "full_name": "No Fit",
            "service_types": ["Plumbing"],
            "skill_level": "Generalist",
            "status": "OffShift"
        }),
    )
    .await;

    let res = app
        .oneshot(get_request(&format!(
            "/applications/{application_id}/candidates"
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    let matches = body.as_array().unwrap();
    assert_eq!(matches.len(), 3);

    assert_eq!(matches[0]["full_name"], "Top Fit");
    assert_eq!(matches[0]["score"], 100);
    assert_eq!(matches[0]["availability"], "Available");
    assert_eq!(
        matches[0]["reasons"],
        json!([
            "service type match",
            "territory match",
            "high competence",
            "available",
            "close to site"
        ])
    );
    assert!(matches[0]["distance_km"].as_f64().unwrap() < 10.0);

    assert_eq!(matches[1]["full_name"], "Mid Fit");
    assert_eq!(matches[1]["score"], 90);
    assert!(matches[1]["distance_km"].is_null());

    assert_eq!(matches[2]["full_name"], "No Fit");
    assert_eq!(matches[2]["score"], 50);
    assert_eq!(matches[2]["availability"], "Busy");
    assert_eq!(matches[2]["reasons"], json!([]));
}

#[tokio::test]
async fn manual_assignment_creates_work_order_and_blocks_reassignment() {
    let (app, _rx) = setup();
    let client = create_client(&app, "Arctic Retail").await;
    let object = create_service_object(&app, client["id"].as_str().unwrap()).await;
    let application = create_application(
        &app,
        client["id"].as_str().unwrap(),
        object["id"].as_str().unwrap(),
        "Urgent",
    )
    .await;
    let application_id = application["id"].as_str().unwrap();

    let employee = create_employee(
        &app,
        json!({
            "full_name": "Dispatch Dana",
            "service_types": ["Ventilation"],
            "territories": ["North"],
            "skill_level": "Specialist",
            "status": "OnShift"
        }),
    )
    .await;
    let employee_id = employee["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/applications/{application_id}/assign"),
            json!({ "employee_id": employee_id }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let work_order = body_json(res).await;
    assert_eq!(work_order["application_id"], application_id);
    assert_eq!(work_order["employee_id"], employee_id);
    assert_eq!(work_order["status"], "Assigned");
    // 50 + 30 + 20 + 15 + 10, no location on either side.
    assert_eq!(work_order["score"], 100);
    assert!(work_order["number"].as_str().unwrap().starts_with("WO-"));

    let res = app
        .clone()
        .oneshot(get_request(&format!("/applications/{application_id}")))
        .await
        .unwrap();
    let updated = body_json(res).await;
    assert_eq!(updated["status"], "InProgress");
    assert_eq!(updated["assigned_employee"], employee_id);

    // A second assignment attempt conflicts.
    let res = app
        .oneshot(json_request(
            "POST",
            &format!("/applications/{application_id}/assign"),
            json!({ "employee_id": employee_id }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn manual_assignment_rejects_unavailable_employee() {
    let (app, _rx) = setup();
    let client = create_client(&app, "Arctic Retail").await;
    let object = create_service_object(&app, client["id"].as_str().unwrap()).await;
    let application = create_application(
        &app,
        client["id"].as_str().unwrap(),
        object["id"].as_str().unwrap(),
        "Medium",
    )
    .await;
    let application_id = application["id"].as_str().unwrap();

    let employee = create_employee(
        &app,
        json!({
            "full_name": "On Vacation",
            "service_types": ["Ventilation"],
            "skill_level": "Generalist",
            "status": "Vacation"
        }),
    )
    .await;

    let res = app
        .oneshot(json_request(
            "POST",
            &format!("/applications/{application_id}/assign"),
            json!({ "employee_id": employee["id"].as_str().unwrap() }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn planner_dispatches_new_applications() {
    let (state, rx) = AppState::new(1024, 1024);
    let shared = Arc::new(state);
    tokio::spawn(run_planner(shared.clone(), rx));
    let app = router(shared.clone());

    let employee = create_employee(
        &app,
        json!({
            "full_name": "Auto Andrei",
            "service_types": ["Ventilation"],
            "territories": ["North"],
            "skill_level": "Specialist",
            "status": "OnShift",
            "location": { "lat": 55.7600, "lng": 37.6200 }
        }),
    )
    .await;
    let employee_id = employee["id"].as_str().unwrap().to_string();

    let client = create_client(&app, "Arctic Retail").await;
    let object = create_service_object(&app, client["id"].as_str().unwrap()).await;
    let application = create_application(
        &app,
        client["id"].as_str().unwrap(),
        object["id"].as_str().unwrap(),
        "High",
    )
    .await;
    let application_id = application["id"].as_str().unwrap().to_string();

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let res = app.clone().oneshot(get_request("/work-orders")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let work_orders = body_json(res).await;
    let list = work_orders.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["employee_id"], employee_id);
    assert_eq!(list[0]["application_id"], application_id);
    assert_eq!(list[0]["score"], 100);

    let res = app
        .clone()
        .oneshot(get_request(&format!("/applications/{application_id}")))
        .await
        .unwrap();
    let updated = body_json(res).await;
    assert_eq!(updated["status"], "InProgress");
    assert_eq!(updated["assigned_employee"], employee_id);

    let res = app.clone().oneshot(get_request("/stats")).await.unwrap();
    let stats = body_json(res).await;
    assert_eq!(stats["active_applications"], 1);
    assert_eq!(stats["employees_on_shift"], 1);

    let res = app.oneshot(get_request("/metrics")).await.unwrap();
    let metrics = body_string(res).await;
    assert!(metrics.contains("work_orders_total{outcome=\"success\"} 1"));
}

#[tokio::test]
async fn planner_requeues_do_not_count_as_work_orders() {
    let (state, rx) = AppState::new(1024, 1024);
    let shared = Arc::new(state);
    tokio::spawn(run_planner(shared.clone(), rx));
    let app = router(shared.clone());

    // No employees at all, so the application can only cycle the queue.
    let client = create_client(&app, "Arctic Retail").await;
    let object = create_service_object(&app, client["id"].as_str().unwrap()).await;
    create_application(
        &app,
        client["id"].as_str().unwrap(),
        object["id"].as_str().unwrap(),
        "High",
    )
    .await;

    tokio::time::sleep(tokio::time::Duration::from_millis(300)).await;

    let res = app.clone().oneshot(get_request("/work-orders")).await.unwrap();
    let work_orders = body_json(res).await;
    assert_eq!(work_orders.as_array().unwrap().len(), 0);

    let res = app.oneshot(get_request("/metrics")).await.unwrap();
    let metrics = body_string(res).await;
    assert!(!metrics.contains("work_orders_total{outcome=\"success\"}"));
}

#[tokio::test]
async fn completing_a_work_order_completes_the_application() {
    let (app, _rx) = setup();
    let client = create_client(&app, "Arctic Retail").await;
    let object = create_service_object(&app, client["id"].as_str().unwrap()).await;
    let application = create_application(
        &app,
        client["id"].as_str().unwrap(),
        object["id"].as_str().unwrap(),
        "Medium",
    )
    .await;
    let application_id = application["id"].as_str().unwrap();

    let employee = create_employee(
        &app,
        json!({
            "full_name": "Finisher Fyodor",
            "service_types": ["Ventilation"],
            "skill_level": "Generalist",
            "status": "OnShift"
        }),
    )
    .await;

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/applications/{application_id}/assign"),
            json!({ "employee_id": employee["id"].as_str().unwrap() }),
        ))
        .await
        .unwrap();
    let work_order = body_json(res).await;
    let work_order_id = work_order["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/work-orders/{work_order_id}/status"),
            json!({ "status": "Completed" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await;
    assert_eq!(updated["status"], "Completed");

    let res = app
        .oneshot(get_request(&format!("/applications/{application_id}")))
        .await
        .unwrap();
    let application = body_json(res).await;
    assert_eq!(application["status"], "Completed");
}

#[tokio::test]
async fn cancelling_a_work_order_reopens_the_application() {
    let (app, _rx) = setup();
    let client = create_client(&app, "Arctic Retail").await;
    let object = create_service_object(&app, client["id"].as_str().unwrap()).await;
    let application = create_application(
        &app,
        client["id"].as_str().unwrap(),
        object["id"].as_str().unwrap(),
        "Medium",
    )
    .await;
    let application_id = application["id"].as_str().unwrap();

    let employee = create_employee(
        &app,
        json!({
            "full_name": "Cancelling Carl",
            "service_types": ["Ventilation"],
            "skill_level": "Generalist",
            "status": "OnShift"
        }),
    )
    .await;

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/applications/{application_id}/assign"),
            json!({ "employee_id": employee["id"].as_str().unwrap() }),
        ))
        .await
        .unwrap();
    let work_order = body_json(res).await;
    let work_order_id = work_order["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/work-orders/{work_order_id}/status"),
            json!({ "status": "Cancelled" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(get_request(&format!("/applications/{application_id}")))
        .await
        .unwrap();
    let application = body_json(res).await;
    assert_eq!(application["status"], "New");
    assert!(application["assigned_employee"].is_null());
}

#[tokio::test]
async fn delete_application_removes_it() {
    let (app, _rx) = setup();
    let client = create_client(&app, "Arctic Retail").await;
    let object = create_service_object(&app, client["id"].as_str().unwrap()).await;
    let application = create_application(
        &app,
        client["id"].as_str().unwrap(),
        object["id"].as_str().unwrap(),
        "Low",
    )
    .await;
    let application_id = application["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(delete_request(&format!("/applications/{application_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .oneshot(get_request(&format!("/applications/{application_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
