use http::{HeaderMap, Method};
use once_cell::sync::Lazy;
use std::env;
use std::fmt;

pub const BODY_PRINT_LIMIT: usize = 10_000;

/// Default print limit, overridable with the `CALLMOCK_BODY_PRINT_LIMIT` environment variable.
pub(crate) static DEFAULT_BODY_PRINT_LIMIT: Lazy<BodyPrintLimit> = Lazy::new(|| {
    match env::var("CALLMOCK_BODY_PRINT_LIMIT")
        .ok()
        .and_then(|x| x.parse::<usize>().ok())
    {
        Some(limit) => BodyPrintLimit::Limited(limit),
        None => BodyPrintLimit::Limited(BODY_PRINT_LIMIT),
    }
});

/// Specifies limitations on printing call bodies in verification failures. Some bodies may be
/// too large to reasonably print and it may be desirable to limit them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyPrintLimit {
    /// Maximum length of a body to print in bytes.
    Limited(usize),
    /// There is no limit to the size of a body that may be printed.
    Unlimited,
}

/// A call received by a mock handler: the arguments the adapter handed over.
///
/// `headers` is `None` for handlers that do not get to see headers (i.e. [`MockHandler`]).
///
/// [`MockHandler`]: crate::MockHandler
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub headers: Option<HeaderMap>,
    pub body: Vec<u8>,
}

impl Call {
    pub(crate) fn new(method: &Method, path: &str, headers: Option<&HeaderMap>, body: &[u8]) -> Self {
        Self {
            method: method.clone(),
            path: path.to_owned(),
            headers: headers.cloned(),
            body: body.to_vec(),
        }
    }

    pub(crate) fn print_with_limit(
        &self,
        mut buffer: impl fmt::Write,
        body_print_limit: BodyPrintLimit,
    ) -> fmt::Result {
        writeln!(buffer, "{} {}", self.method, self.path)?;
        if let Some(headers) = &self.headers {
            for name in headers.keys() {
                let values = headers
                    .get_all(name)
                    .iter()
                    .map(|value| String::from_utf8_lossy(value.as_bytes()))
                    .collect::<Vec<_>>();
                let values = values.join(",");
                writeln!(buffer, "{}: {}", name, values)?;
            }
        }

        match body_print_limit {
            BodyPrintLimit::Limited(limit) if self.body.len() > limit => {
                // Back off to the closest char boundary at or before the limit.
                let mut end_byte = limit;
                while end_byte > 0 && std::str::from_utf8(&self.body[..end_byte]).is_err() {
                    // A utf-8 char is at most 4 bytes long: if we go further back, it's binary.
                    if limit - end_byte >= 3 {
                        end_byte = 0;
                        break;
                    }
                    end_byte -= 1;
                }
                if end_byte == 0 && limit > 0 {
                    return writeln!(
                        buffer,
                        "Body is likely binary (invalid utf-8) size is {} bytes",
                        self.body.len()
                    );
                }
                let truncated = String::from_utf8_lossy(&self.body[..end_byte]);
                writeln!(buffer, "{}", truncated)?;
                writeln!(
                    buffer,
                    "We truncated the body because it was too large: {} bytes (limit: {} bytes)",
                    self.body.len(),
                    limit
                )?;
                writeln!(
                    buffer,
                    "Increase this limit by setting `CALLMOCK_BODY_PRINT_LIMIT`, or calling `with_body_print_limit` when building your mock handler"
                )
            }
            _ => {
                if let Ok(body) = std::str::from_utf8(&self.body) {
                    writeln!(buffer, "{}", body)
                } else {
                    writeln!(
                        buffer,
                        "Body is likely binary (invalid utf-8) size is {} bytes",
                        self.body.len()
                    )
                }
            }
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print_with_limit(f, *DEFAULT_BODY_PRINT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn call(body: &[u8]) -> Call {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        Call::new(&Method::POST, "/echo?x=1", Some(&headers), body)
    }

    fn printed(call: &Call, limit: BodyPrintLimit) -> String {
        let mut buffer = String::new();
        call.print_with_limit(&mut buffer, limit).unwrap();
        buffer
    }

    #[test]
    fn prints_method_path_headers_and_body() {
        let output = printed(&call(b"hello"), BodyPrintLimit::Unlimited);

        assert_eq!(
            output,
            "POST /echo?x=1\naccept: text/plain,application/json\nhello\n"
        );
    }

    #[test]
    fn calls_without_headers_print_no_header_lines() {
        let call = Call::new(&Method::GET, "/", None, b"");

        assert_eq!(printed(&call, BodyPrintLimit::Unlimited), "GET /\n\n");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let output = printed(&call(b"0123456789"), BodyPrintLimit::Limited(4));

        assert!(output.contains("\n0123\n"));
        assert!(output.contains("too large: 10 bytes (limit: 4 bytes)"));
    }

    #[test]
    fn truncation_does_not_split_a_character() {
        // 'é' is two bytes long: a limit of 2 falls in its middle.
        let output = printed(&call("aébc".as_bytes()), BodyPrintLimit::Limited(2));

        assert!(output.contains("\na\n"));
    }

    #[test]
    fn binary_bodies_are_not_printed() {
        let output = printed(&call(&[0xff, 0xfe, 0xfd]), BodyPrintLimit::Unlimited);

        assert!(output.ends_with("Body is likely binary (invalid utf-8) size is 3 bytes\n"));
    }
}
