use callmock::matchers::{anything, bearer_token, header, json, matched_by, partial_json, regex};
use callmock::{MockHandler, MockHandlerWithHeaders, MockServer, Response};
use http::Method;
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
struct NewObject {
    name: String,
    size: u32,
}

#[async_std::test]
async fn a_matching_call_gets_the_canned_response() {
    // Arrange
    let downstream = MockHandler::new();
    downstream
        .on("GET", "/object/12345", anything())
        .returns(Response::ok().set_body_string(r#"{"status": "ok"}"#));
    let mock_server = MockServer::start(downstream.clone());

    // Act
    let response = reqwest::get(format!("{}/object/12345", mock_server.uri()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), r#"{"status": "ok"}"#);
    downstream.verify();
}

#[async_std::test]
async fn returns_404_if_nothing_matches() {
    // Arrange - no expectations
    let downstream = MockHandler::new();
    let mock_server = MockServer::start(downstream.clone());

    // Act
    let status = reqwest::get(mock_server.uri()).await.unwrap().status();

    // Assert
    assert_eq!(status, 404);
    assert_eq!(downstream.received_calls().len(), 1);
}

#[async_std::test]
#[should_panic(expected = "- Unexpected call: GET /object/12345")]
async fn an_unexpected_call_fails_verification() {
    // Arrange
    let downstream = MockHandler::new();
    let mock_server = MockServer::start(downstream.clone());

    // Act
    reqwest::get(format!("{}/object/12345", mock_server.uri()))
        .await
        .unwrap();

    // Assert
    downstream.verify();
}

#[async_std::test]
#[should_panic(expected = "Verifications failed:
- Expectation #0 (object lookup).
\tArguments: (\"GET\", \"/object/12345\", anything)
\tExpected range of matching calls: 1 <= x
\tNumber of matched calls: 0

The handler did not receive any call.")]
async fn an_expectation_that_was_never_met_fails_verification() {
    // Arrange
    let downstream = MockHandler::new();
    downstream
        .on("GET", "/object/12345", anything())
        .named("object lookup")
        .returns(Response::ok());
    let _mock_server = MockServer::start(downstream.clone());

    // Act - we never call the server

    // Assert
    downstream.verify();
}

#[async_std::test]
async fn a_json_body_is_matched_structurally() {
    // Arrange
    let downstream = MockHandler::new();
    downstream
        .on(
            "POST",
            "/objects",
            json(json!({"name": "widget", "size": 3})),
        )
        .returns(Response::new(201));
    let mock_server = MockServer::start(downstream.clone());
    let client = reqwest::Client::new();

    // Act
    let matching = client
        .post(format!("{}/objects", mock_server.uri()))
        // Whitespace and key order are irrelevant.
        .body(r#"{ "size": 3,   "name": "widget" }"#)
        .send()
        .await
        .unwrap()
        .status();

    // Assert
    assert_eq!(matching, 201);
    downstream.verify();
}

#[async_std::test]
async fn a_partial_json_body_ignores_extra_fields() {
    // Arrange
    let downstream = MockHandler::new();
    downstream
        .on("POST", "/objects", partial_json(json!({"name": "widget"})))
        .returns(Response::new(201));
    let mock_server = MockServer::start(downstream.clone());

    // Act
    let status = reqwest::Client::new()
        .post(format!("{}/objects", mock_server.uri()))
        .json(&NewObject {
            name: "widget".into(),
            size: 3,
        })
        .send()
        .await
        .unwrap()
        .status();

    // Assert
    assert_eq!(status, 201);
}

#[async_std::test]
async fn expectations_are_matched_in_registration_order() {
    // Arrange
    let downstream = MockHandler::new();
    downstream
        .on(Method::GET, regex(r"^/objects/\d+$"), anything())
        .up_to_n_times(1)
        .returns(Response::ok().set_body_string("first"));
    downstream
        .on(Method::GET, regex(r"^/objects/\d+$"), anything())
        .returns(Response::ok().set_body_string("second"));
    let mock_server = MockServer::start(downstream.clone());
    let url = format!("{}/objects/7", mock_server.uri());

    // Act
    let first = reqwest::get(&url).await.unwrap().text().await.unwrap();
    let second = reqwest::get(&url).await.unwrap().text().await.unwrap();

    // Assert
    assert_eq!(first, "first");
    assert_eq!(second, "second");
    downstream.verify();
}

#[async_std::test]
async fn times_is_checked_against_the_matching_calls() {
    // Arrange
    let downstream = MockHandler::new();
    downstream
        .on(
            "DELETE",
            matched_by(|path: &str| path.starts_with("/objects/")),
            anything(),
        )
        .times(2)
        .returns(Response::new(204));
    let mock_server = MockServer::start(downstream.clone());
    let client = reqwest::Client::new();

    // Act
    for id in 1..=2 {
        let status = client
            .delete(format!("{}/objects/{}", mock_server.uri(), id))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, 204);
    }

    // Assert
    downstream.verify();
}

#[async_std::test]
async fn reset_forgets_expectations_and_calls() {
    // Arrange
    let downstream = MockHandler::new();
    downstream
        .on("GET", "/", anything())
        .returns(Response::ok());
    let mock_server = MockServer::start(downstream.clone());
    reqwest::get(mock_server.uri()).await.unwrap();

    // Act
    downstream.reset();
    let status = reqwest::get(mock_server.uri()).await.unwrap().status();

    // Assert
    assert_eq!(status, 404);
    assert_eq!(downstream.received_calls().len(), 1);
}

#[async_std::test]
async fn header_expectations_need_the_header() {
    // Arrange
    let downstream = MockHandlerWithHeaders::new();
    downstream
        .on("GET", "/object/12345", header("MOCK", "this"), anything())
        .returns(Response::ok());
    let mock_server = MockServer::start_with_headers(downstream.clone());
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
#[should_panic(expected = "- Unexpected call: GET /object/12345")]
async fn a_call_missing_the_header_fails_verification() {
    // Arrange
    let downstream = MockHandlerWithHeaders::new();
    downstream
        .on("GET", "/object/12345", header("MOCK", "this"), anything())
        .times(..)
        .returns(Response::ok());
    let mock_server = MockServer::start_with_headers(downstream.clone());

    // Act
    reqwest::get(format!("{}/object/12345", mock_server.uri()))
        .await
        .unwrap();

    // Assert
    downstream.verify();
}

#[async_std::test]
async fn bearer_tokens_are_matched() {
    // Arrange
    let downstream = MockHandlerWithHeaders::new();
    downstream
        .on("GET", "/me", bearer_token("delightful"), anything())
        .returns(Response::ok());
    let mock_server = MockServer::start_with_headers(downstream.clone());

    // Act
    let status = reqwest::Client::new()
        .get(format!("{}/me", mock_server.uri()))
        .bearer_auth("delightful")
        .send()
        .await
        .unwrap()
        .status();

    // Assert
    assert_eq!(status, 200);
    downstream.verify();
}

#[async_std::test]
async fn a_header_mock_started_as_a_plain_handler_still_sees_headers() {
    // Arrange
    let downstream = MockHandlerWithHeaders::new();
    downstream
        .on("GET", "/object/12345", header("MOCK", "this"), anything())
        .returns(Response::ok());
    let mock_server = MockServer::start(downstream.clone());

    // Act
    let status = reqwest::Client::new()
        .get(format!("{}/object/12345", mock_server.uri()))
        .header("MOCK", "this")
        .send()
        .await
        .unwrap()
        .status();

    // Assert
    assert_eq!(status, 200);
    downstream.verify();
}
