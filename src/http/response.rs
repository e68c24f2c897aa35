use std::io::{BufReader, Read};

use serde::Serialize;

use crate::api::{Envelope, ErrorBody};
use crate::errors::{Error, Result};
use crate::http::request::{content_length, owned_headers, read_body, read_head};

/// An HTTP response to be sent to a client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code of the response. Optional because that's what httparse returns, but it
    /// shouldn't happen in practice since we control the responses.
    pub status: Option<u16>,
    /// Headers for the response. It is not necessary to add Content-Length to it, this is done
    /// automatically on serialization.
    pub headers: Vec<(String, String)>,
    /// Body of the response. Give an empty string for an empty body
    pub body: String,
}

fn json_headers() -> Vec<(String, String)> {
    vec![("Content-Type".to_string(), "application/json".to_string())]
}

impl Response {
    /// Creates an empty No Content response (204)
    pub fn no_content() -> Response {
        Response {
            status: Some(204),
            headers: vec![],
            body: String::new(),
        }
    }

    /// Creates an OK (200) response with the given body
    pub fn ok_with_body(str: String) -> Response {
        Response {
            status: Some(200),
            headers: vec![],
            body: str,
        }
    }

    /// Creates a response whose body is `{"data": <data>}`
    pub fn data<T: Serialize>(status: u16, data: &T) -> Result<Response> {
        Ok(Response {
            status: Some(status),
            headers: json_headers(),
            body: serde_json::to_string(&Envelope::new(data))?,
        })
    }

    /// 200 with the given payload
    pub fn ok<T: Serialize>(data: &T) -> Result<Response> {
        Self::data(200, data)
    }

    /// 201 with the given payload
    pub fn created<T: Serialize>(data: &T) -> Result<Response> {
        Self::data(201, data)
    }

    /// Creates an error response with a `{"error": <message>}` body.
    ///
    /// Internal errors only expose a generic message, the details are logged.
    pub fn from_error(err: &Error) -> Response {
        let status = err.status();
        if status >= 500 {
            tracing::error!(%err, "Request failed");
        } else {
            tracing::warn!(status, %err, "Request rejected");
        }
        let body = ErrorBody {
            error: err.public_message(),
        };
        Response {
            status: Some(status),
            headers: json_headers(),
            body: serde_json::to_string(&body).unwrap_or_default(),
        }
    }

    /// Creates an error response with no body, for requests we couldn't even parse
    pub fn bare_error(code: u16) -> Response {
        Response {
            status: Some(code),
            headers: vec![],
            body: String::new(),
        }
    }

    /// Deserialize the `data` payload of a successful response
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str::<Envelope<T>>(&self.body)?.data)
    }

    /// The message of an error response
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .map(|body| body.error)
    }
}

/// Parse an HTTP response from a byte stream
pub fn parse_response<T>(mut buf_reader: BufReader<T>) -> Result<Response>
where
    T: Read,
{
    let (bytes, head_len, (body_len, mut response)) = read_head(&mut buf_reader, |bytes| {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut resp = httparse::Response::new(&mut headers);
        match resp.parse(bytes)? {
            httparse::Status::Complete(head_len) => {
                let response = Response {
                    status: resp.code,
                    headers: owned_headers(resp.headers),
                    body: String::new(),
                };
                Ok(Some((head_len, (content_length(resp.headers), response))))
            }
            httparse::Status::Partial => Ok(None),
        }
    })?;

    response.body = read_body(&mut buf_reader, bytes, head_len, body_len)?;
    Ok(response)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;
    use serde_json::json;

    #[test]
    fn test_parse_simple_response() {
        let req_str = b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed = parse_response(buf_reader).unwrap();

        assert_eq!(parsed.status, Some(204));
        assert_eq!(parsed.headers.len(), 1);
        assert_eq!(parsed.body, "");
    }

    #[test]
    fn test_parse_response_with_large_body() {
        let mut rng = rand::thread_rng();
        let mut buffer = [0; 4096];
        for c in buffer.iter_mut() {
            *c = rng.gen_range(b'a'..=b'z')
        }
        let body = String::from_utf8_lossy(&buffer);

        let resp_str = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            buffer.len(),
            body
        );

        let parsed_resp = parse_response(BufReader::new(resp_str.as_bytes())).unwrap();

        assert_eq!(parsed_resp.headers.len(), 1);
        assert_eq!(parsed_resp.body, body);
    }

    #[test]
    fn test_data_envelope() {
        let response = Response::created(&json!({ "id": "1" })).unwrap();
        assert_eq!(response.status, Some(201));
        assert_eq!(response.body, r#"{"data":{"id":"1"}}"#);
        let payload: serde_json::Value = response.payload().unwrap();
        assert_eq!(payload["id"], "1");
    }

    #[test]
    fn test_error_body() {
        let response = Response::from_error(&Error::NotFound("Order \"42\" does not exist.".into()));
        assert_eq!(response.status, Some(404));
        assert_eq!(response.error_message().unwrap(), "Order \"42\" does not exist.");

        let response = Response::from_error(&Error::ConnectionReset);
        assert_eq!(response.status, Some(500));
        assert_eq!(response.error_message().unwrap(), "Internal server error");
    }
}
