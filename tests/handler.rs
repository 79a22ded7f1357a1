use callmock::matchers::{header, multi_header};
use callmock::{to_json, Handler, HandlerWithHeaders, MockServer, OkHandler, Response};
use http::{HeaderMap, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Greeting {
    greeting: String,
}

#[async_std::test]
async fn the_handler_answers_a_simple_get() {
    // Arrange
    let mock_server = MockServer::start(|method: &Method, path: &str, _body: &[u8]| {
        if method == "GET" && path == "/object/12345" {
            Response::ok().set_body_string(r#"{"status": "ok"}"#)
        } else {
            Response::new(404)
        }
    });

    // Act
    let response = reqwest::get(format!("{}/object/12345", mock_server.uri()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), r#"{"status": "ok"}"#);
}

#[async_std::test]
async fn the_handler_sees_the_method_path_and_body_of_each_request() {
    // Arrange
    let calls = Arc::new(Mutex::new(vec![]));
    let recorded = calls.clone();
    let mock_server = MockServer::start(move |method: &Method, path: &str, body: &[u8]| {
        recorded
            .lock()
            .unwrap()
            .push((method.clone(), path.to_owned(), body.to_vec()));
        Response::ok()
    });

    // Act
    reqwest::Client::new()
        .put(format!("{}/object/12345?verbose=true&page=2", mock_server.uri()))
        .body("payload")
        .send()
        .await
        .unwrap();

    // Assert
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, Method::PUT);
    assert_eq!(calls[0].1, "/object/12345?verbose=true&page=2");
    assert_eq!(calls[0].2, b"payload");
}

#[async_std::test]
async fn a_zero_status_is_sent_as_200() {
    // Arrange
    let mock_server = MockServer::start(|_: &Method, _: &str, _: &[u8]| Response::default());

    // Act
    let status = reqwest::get(mock_server.uri()).await.unwrap().status();

    // Assert
    assert_eq!(status, 200);
}

#[async_std::test]
async fn an_explicit_status_is_sent_as_is() {
    let mock_server = MockServer::start(|_: &Method, _: &str, _: &[u8]| Response::new(418));

    let status = reqwest::get(mock_server.uri()).await.unwrap().status();

    assert_eq!(status, 418);
}

#[async_std::test]
async fn every_header_value_is_sent() {
    // Arrange
    let mock_server = MockServer::start(|_: &Method, _: &str, _: &[u8]| {
        Response::ok()
            .append_header("set-cookie", "a=1")
            .append_header("set-cookie", "b=2")
            .insert_header("x-request-id", "42")
    });

    // Act
    let response = reqwest::get(mock_server.uri()).await.unwrap();

    // Assert
    let cookies: Vec<_> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|value| value.to_str().unwrap().to_owned())
        .collect();
    assert_eq!(cookies, vec!["a=1", "b=2"]);
    assert_eq!(response.headers()["x-request-id"], "42");
}

#[async_std::test]
async fn the_body_is_sent_verbatim() {
    // Arrange
    let mock_server = MockServer::start(|_: &Method, _: &str, _: &[u8]| {
        Response::ok().set_body_bytes(vec![0u8, 159, 146, 150])
    });

    // Act
    let body = reqwest::get(mock_server.uri())
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();

    // Assert
    assert_eq!(body.as_ref(), &[0u8, 159, 146, 150]);
}

#[async_std::test]
async fn a_json_body_can_be_echoed_back() {
    // Arrange
    let mock_server = MockServer::start(|method: &Method, _: &str, body: &[u8]| {
        if method != "POST" {
            return Response::new(405);
        }
        let greeting: Greeting = serde_json::from_slice(body).unwrap();
        Response::new(201).set_body_json(&Greeting {
            greeting: format!("{} back", greeting.greeting),
        })
    });

    // Act
    let response = reqwest::Client::new()
        .post(format!("{}/greetings", mock_server.uri()))
        .json(&Greeting {
            greeting: "hello".into(),
        })
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), 201);
    let body: Greeting = response.json().await.unwrap();
    assert_eq!(
        body,
        Greeting {
            greeting: "hello back".into()
        }
    );
}

#[async_std::test]
async fn to_json_builds_a_response_body_inline() {
    // Arrange
    let mock_server = MockServer::start(|_: &Method, _: &str, _: &[u8]| Response {
        status: 200,
        body: to_json(&json!({"status": "ok", "items": [1, 2, 3]})),
        ..Default::default()
    });

    // Act
    let body: Value = reqwest::get(mock_server.uri())
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(body, json!({"status": "ok", "items": [1, 2, 3]}));
}

#[async_std::test]
async fn the_ok_handler_answers_200_to_everything() {
    let mock_server = MockServer::start(OkHandler);

    let response = reqwest::Client::new()
        .delete(format!("{}/anything/at/all", mock_server.uri()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.bytes().await.unwrap().is_empty());
}

#[async_std::test]
async fn a_header_aware_handler_sees_the_request_headers() {
    // Arrange
    let expected = header("MOCK", "this");
    let mock_server = MockServer::start_with_headers(
        move |_: &Method, path: &str, headers: &HeaderMap, _: &[u8]| {
            if path == "/object/12345" && expected.matches(headers) {
                Response::ok()
            } else {
                Response::new(404)
            }
        },
    );
    let client = reqwest::Client::new();
    let url = format!("{}/object/12345", mock_server.uri());

    // Act
    let with_header = client
        .get(&url)
        .header("MOCK", "this")
        .send()
        .await
        .unwrap()
        .status();
    let without_header = client.get(&url).send().await.unwrap().status();

    // Assert
    assert_eq!(with_header, 200);
    assert_eq!(without_header, 404);
}

#[async_std::test]
async fn a_multi_header_matcher_requires_every_desired_header() {
    // Arrange
    let mut desired = HeaderMap::new();
    desired.insert("x-tenant", HeaderValue::from_static("acme"));
    desired.insert("x-region", HeaderValue::from_static("eu"));
    let expected = multi_header(desired);
    let mock_server =
        MockServer::start_with_headers(move |_: &Method, _: &str, headers: &HeaderMap, _: &[u8]| {
            if expected.matches(headers) {
                Response::ok()
            } else {
                Response::new(400)
            }
        });
    let client = reqwest::Client::new();

    // Act
    let both = client
        .get(mock_server.uri())
        .header("x-tenant", "acme")
        .header("x-region", "eu")
        .header("x-unrelated", "ignored")
        .send()
        .await
        .unwrap()
        .status();
    let one = client
        .get(mock_server.uri())
        .header("x-tenant", "acme")
        .send()
        .await
        .unwrap()
        .status();

    // Assert
    assert_eq!(both, 200);
    assert_eq!(one, 400);
}

struct BothShapes;

impl Handler for BothShapes {
    fn handle(&self, _: &Method, _: &str, _: &[u8]) -> Response {
        Response::ok().set_body_string("basic")
    }

    fn as_header_aware(&self) -> Option<&dyn HandlerWithHeaders> {
        Some(self)
    }
}

impl HandlerWithHeaders for BothShapes {
    fn handle_with_headers(&self, _: &Method, _: &str, _: &HeaderMap, _: &[u8]) -> Response {
        Response::ok().set_body_string("with headers")
    }
}

#[async_std::test]
async fn a_handler_with_both_shapes_is_always_called_with_headers() {
    // Arrange
    let mock_server = MockServer::start(BothShapes);

    // Act
    let body = reqwest::get(mock_server.uri())
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // Assert
    assert_eq!(body, "with headers");
}
