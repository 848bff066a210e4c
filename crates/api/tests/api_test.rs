use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use tokio::time::timeout;
use tower::ServiceExt;

use alchemist_api::{create_app, AppState};
use alchemist_application::Session;
use alchemist_config::ApiConfig;
use alchemist_testing_utils::{
    MockInterpreter, SAMPLE_CLIENTS_CSV, SAMPLE_FINDINGS, SAMPLE_TASKS_CSV, SAMPLE_WORKERS_CSV,
};

fn app_with(interpreter: MockInterpreter) -> Router {
    let state = AppState::new(Session::default(), Arc::new(interpreter));
    create_app(state, &ApiConfig::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn upload(app: &Router, entity: &str, csv: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/uploads/{entity}"))
        .header("content-type", "text/csv")
        .body(Body::from(csv.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn loaded_app(interpreter: MockInterpreter) -> Router {
    let app = app_with(interpreter);
    for (entity, csv) in [
        ("clients", SAMPLE_CLIENTS_CSV),
        ("workers", SAMPLE_WORKERS_CSV),
        ("tasks", SAMPLE_TASKS_CSV),
    ] {
        let (status, _) = upload(&app, entity, csv).await;
        assert_eq!(status, StatusCode::OK);
    }
    app
}

fn finding_messages(report: &Value) -> Vec<String> {
    report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|finding| finding["message"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_upload_replaces_table_and_reports_findings() {
    let app = loaded_app(MockInterpreter::new()).await;

    let (status, body) = send(&app, "POST", "/api/validate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let expected: Vec<String> = SAMPLE_FINDINGS
        .iter()
        .map(|(_, _, message)| message.to_string())
        .collect();
    assert_eq!(finding_messages(&body["data"]), expected);
    assert_eq!(body["data"]["summary"]["clients"], 4);

    // 重新上传只替换对应的表
    let (status, body) = upload(&app, "clients", "ClientID,PriorityLevel\nC9,2\n").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["summary"]["loaded"], 1);
    assert_eq!(body["data"]["report"]["summary"]["clients"], 0);

    let (_, body) = send(&app, "GET", "/api/tables/clients", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["ClientID"], "C9");
}

#[tokio::test]
async fn test_upload_without_header_is_rejected() {
    let app = loaded_app(MockInterpreter::new()).await;

    let (status, body) = upload(&app, "tasks", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // 失败的上传不改变已有数据
    let (_, body) = send(&app, "GET", "/api/tables/tasks", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_edit_cell_revalidates() {
    let app = loaded_app(MockInterpreter::new()).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/tables/clients/1",
        Some(json!({"field": "PriorityLevel", "value": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = finding_messages(&body["data"]);
    assert_eq!(messages.len(), SAMPLE_FINDINGS.len() - 1);
    assert!(!messages.contains(&"PriorityLevel must be 1–5".to_string()));

    let (status, _) = send(
        &app,
        "PUT",
        "/api/tables/clients/9",
        Some(json!({"field": "PriorityLevel", "value": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/tables/tasks/0",
        Some(json!({"field": "Colour", "value": "red"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"]["type"], "UNKNOWN_FIELD");
}

#[tokio::test]
async fn test_suggest_then_apply_correction() {
    let interpreter = MockInterpreter::new().with_reply(
        "PriorityLevel must be",
        r#"{"entity":"clients","row":1,"field":"PriorityLevel","suggestedValue":1}"#,
    );
    let app = loaded_app(interpreter.clone()).await;

    let (status, body) = send(&app, "POST", "/api/corrections/suggest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(interpreter.call_count(), SAMPLE_FINDINGS.len());

    // 其他问题得到的是 "{}"，被丢弃
    let suggestions = body["data"].as_array().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(
        suggestions[0]["description"],
        "Client (row 2): Set PriorityLevel to 1"
    );

    // 建议不会自动应用
    let (_, body) = send(&app, "GET", "/api/tables/clients", None).await;
    assert_eq!(body["data"][1]["PriorityLevel"], 7);

    let correction = json!({
        "entity": "Client",
        "row": 1,
        "field": "PriorityLevel",
        "suggestedValue": 1
    });
    let (status, body) = send(&app, "POST", "/api/corrections/apply", Some(correction)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        finding_messages(&body["data"]).len(),
        SAMPLE_FINDINGS.len() - 1
    );
}

#[tokio::test]
async fn test_rules_structured_and_natural_language() {
    let interpreter = MockInterpreter::new()
        .with_reply("T1 and T2 must run together", r#"{"type":"coRun","tasks":["T1","T2"]}"#)
        .with_reply("nonsense", r#"{"tasks":["T1"]}"#);
    let app = loaded_app(interpreter.clone()).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/rules",
        Some(json!({"type": "loadLimit", "group": "GroupA", "maxSlotsPerPhase": "2"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["type"], "loadLimit");
    assert_eq!(body["data"]["maxSlotsPerPhase"], 2);

    let (status, body) = send(
        &app,
        "POST",
        "/api/rules/natural-language",
        Some(json!({"text": "Tasks T1 and T2 must run together"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"], json!({"type": "coRun", "tasks": ["T1", "T2"]}));
    assert!(interpreter.prompts()[0].contains("Data context"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/rules/natural-language",
        Some(json!({"text": "nonsense"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&app, "GET", "/api/rules", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        "POST",
        "/api/rules",
        Some(json!({"type": "loadLimit", "maxSlotsPerPhase": "many"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_priorities_and_rules_export() {
    let app = app_with(MockInterpreter::new());

    let (status, body) = send(
        &app,
        "PUT",
        "/api/priorities",
        Some(json!({"name": "fairness", "value": 40})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fairness"], 40);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/priorities",
        Some(json!({"name": "fairness", "value": 101})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&app, "GET", "/api/export/rules", None).await;
    assert_eq!(
        body["data"],
        json!({
            "rules": [],
            "priorities": {"priorityLevel": 50, "taskFulfillment": 30, "fairness": 40}
        })
    );
}

#[tokio::test]
async fn test_search_sets_and_clears_task_view() {
    let interpreter = MockInterpreter::new().with_reply(
        "longer than one phase",
        r#"{"entity":"tasks","filter":{"Duration":">1"}}"#,
    );
    let app = loaded_app(interpreter).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/search",
        Some(json!({"query": "tasks longer than one phase"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["TaskID"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["T1", "T3"]);

    let (_, body) = send(&app, "GET", "/api/tables/tasks", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    let (_, body) = send(&app, "GET", "/api/tables/tasks?all=true", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    // 无法识别的回复不改变视图
    let (status, body) = send(
        &app,
        "POST",
        "/api/search",
        Some(json!({"query": "something else"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"]["type"], "INTERPRETER_RESPONSE");
    let (_, body) = send(&app, "GET", "/api/tables/tasks", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, "DELETE", "/api/search", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_ask_ai_proxies_interpreter() {
    let app = app_with(MockInterpreter::new().with_fallback(r#"{"type":"coRun"}"#));
    let (status, body) = send(
        &app,
        "POST",
        "/api/ask-ai",
        Some(json!({"prompt": "anything"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["result"], r#"{"type":"coRun"}"#);

    let app = app_with(MockInterpreter::failing("upstream timeout"));
    let (status, body) = send(
        &app,
        "POST",
        "/api/ask-ai",
        Some(json!({"prompt": "anything"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "AI failed to interpret query.");
}

#[tokio::test]
async fn test_spreadsheet_upload_is_parsed() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "WorkerID").unwrap();
    sheet.write_string(0, 1, "AvailableSlots").unwrap();
    sheet.write_string(0, 2, "MaxLoadPerPhase").unwrap();
    sheet.write_string(1, 0, "W1").unwrap();
    sheet.write_string(1, 1, "[1,2]").unwrap();
    sheet.write_number(1, 2, 3.0).unwrap();
    let content = workbook.save_to_buffer().unwrap();

    let app = app_with(MockInterpreter::new());
    let request = Request::builder()
        .method("POST")
        .uri("/api/uploads/workers")
        .header(
            "content-type",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )
        .body(Body::from(content))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/tables/workers", None).await;
    assert_eq!(body["data"][0]["WorkerID"], "W1");
    assert_eq!(body["data"][0]["MaxLoadPerPhase"], 3);

    let (_, body) = send(&app, "POST", "/api/validate", None).await;
    assert_eq!(
        finding_messages(&body["data"]),
        vec!["AvailableSlots count must be ≥ MaxLoadPerPhase"]
    );
}

#[tokio::test]
async fn test_other_routes_proceed_during_rule_interpretation() {
    let (interpreter, gate) = MockInterpreter::new()
        .with_reply("must run together", r#"{"type":"coRun","tasks":["T1","T2"]}"#)
        .gated();
    let app = loaded_app(interpreter).await;

    let pending = tokio::spawn({
        let app = app.clone();
        async move {
            send(
                &app,
                "POST",
                "/api/rules/natural-language",
                Some(json!({"text": "Tasks T1 and T2 must run together"})),
            )
            .await
        }
    });
    gate.entered().await;

    let (status, body) = timeout(Duration::from_secs(5), send(&app, "POST", "/api/validate", None))
        .await
        .expect("validate waited for the interpreter");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finding_messages(&body["data"]).len(), SAMPLE_FINDINGS.len());

    let (status, _) = timeout(
        Duration::from_secs(5),
        send(&app, "PUT", "/api/tables/clients/1", Some(json!({"field": "PriorityLevel", "value": 2}))),
    )
    .await
    .expect("edit waited for the interpreter");
    assert_eq!(status, StatusCode::OK);

    gate.release();
    let (status, body) = pending.await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["type"], "coRun");

    let (_, body) = send(&app, "GET", "/api/rules", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_interpretation_does_not_hold_session() {
    let (interpreter, gate) = MockInterpreter::new()
        .with_fallback(r#"{"entity":"tasks","filter":{"Duration":">1"}}"#)
        .gated();
    let app = loaded_app(interpreter).await;

    let pending = tokio::spawn({
        let app = app.clone();
        async move {
            send(&app, "POST", "/api/search", Some(json!({"query": "long tasks"}))).await
        }
    });
    gate.entered().await;

    let (status, body) = timeout(
        Duration::from_secs(5),
        send(&app, "GET", "/api/tables/tasks", None),
    )
    .await
    .expect("table read waited for the interpreter");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    gate.release();
    let (status, body) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}
