use serde::Serialize;

/// Convert a value to its JSON representation, inline.
///
/// It panics on failure: a value that cannot be serialized is a mistake in the test fixture,
/// not something a test should recover from.
///
/// ```rust
/// use callmock::{to_json, Response};
/// use serde_json::json;
///
/// let response = Response {
///     body: to_json(&json!({"status": "ok"})),
///     ..Default::default()
/// };
/// assert_eq!(response.body, br#"{"status":"ok"}"#);
/// ```
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    match serde_json::to_vec(value) {
        Ok(json) => json,
        Err(e) => panic!(
            "Failed to convert `{}` to JSON: {}",
            std::any::type_name::<T>(),
            e
        ),
    }
}
