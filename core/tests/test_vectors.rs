//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Bodies are compared as parsed JSON so field
//! order never causes a false failure.

use serde_json::Value;
use todo_core::{ApiError, CreateTodo, HttpRequest, HttpResponse, Todo, TodoClient};

const BASE_URL: &str = "http://localhost:8080";

fn client() -> TodoClient {
    TodoClient::new(BASE_URL)
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method.as_str(), expected["method"].as_str().unwrap(), "{name}: method");
    assert_eq!(
        req.path,
        format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
        "{name}: path"
    );

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .map(|headers| {
            headers
                .iter()
                .map(|h| {
                    let pair = h.as_array().unwrap();
                    (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
                })
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let actual: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: unexpected body"),
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let vectors: Value = serde_json::from_str(include_str!("../../test-vectors/create.json")).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: CreateTodo = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_create_todo(&input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let todo = c.parse_create_todo(simulated(case)).unwrap();
        let expected: Todo = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(todo, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let vectors: Value = serde_json::from_str(include_str!("../../test-vectors/list.json")).unwrap();

    let c = client();
    assert_request("list", &c.build_list_todos(), &vectors["expected_request"]);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let todos = c.parse_list_todos(simulated(case)).unwrap();
        let expected: Vec<Todo> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(todos, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Reorder
// ---------------------------------------------------------------------------

#[test]
fn reorder_test_vectors() {
    let vectors: Value = serde_json::from_str(include_str!("../../test-vectors/reorder.json")).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let ids: Vec<i64> = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_reorder_todos(&ids).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let message = c.parse_reorder_todos(simulated(case)).unwrap();
        assert_eq!(message, case["expected_result"].as_str().unwrap(), "{name}: message");
    }

    for case in vectors["error_cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let err = c.parse_reorder_todos(simulated(case)).unwrap_err();
        match case["expected_error"].as_str().unwrap() {
            "bad_request" => assert!(matches!(err, ApiError::BadRequest(_)), "{name}: {err:?}"),
            "http_error" => assert!(matches!(err, ApiError::HttpError { .. }), "{name}: {err:?}"),
            other => panic!("unknown expected_error: {other}"),
        }
    }
}
