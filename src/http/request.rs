use crate::errors::{Error, Result};
use serde_json::{Map, Value};
use std::io::{BufReader, Read};

/// Requests with a larger head or body are refused
pub const MAX_REQUEST_SIZE: usize = 1 << 20;

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method used in the request
    pub method: String,
    /// The full target of the request, query string included
    pub path: String,
    /// Headers of the request
    pub headers: Vec<(String, String)>,
    /// Body of the request
    pub body: String,
}

impl Request {
    /// Create a new request from scratch
    pub fn new(method: &str, path: &str, headers: Vec<(String, String)>, body: String) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            headers,
            body,
        }
    }
    /// Create a new GET request for the given path, with an empty body
    pub fn get(path: &str) -> Request {
        Request::new("GET", path, vec![], String::new())
    }
    /// Create a new POST request for the given path, with the given body
    pub fn post(path: &str, body: String) -> Request {
        Request::new("POST", path, vec![], body)
    }
    /// Create a new PUT request for the given path, with the given body
    pub fn put(path: &str, body: String) -> Request {
        Request::new("PUT", path, vec![], body)
    }
    /// Create a new DELETE request for the given path, with an empty body
    pub fn delete(path: &str) -> Request {
        Request::new("DELETE", path, vec![], String::new())
    }

    /// The path without its query string, which is what routing looks at
    pub fn route_path(&self) -> &str {
        self.path
            .split_once('?')
            .map_or(self.path.as_str(), |(path, _)| path)
    }

    /// The object under `data` in a JSON body
    pub fn data(&self) -> Result<Map<String, Value>> {
        let invalid =
            || Error::BadRequest("Request body must be a JSON object with a data field".to_string());
        let mut body: Value = serde_json::from_str(&self.body).map_err(|_| invalid())?;
        match body.get_mut("data").map(Value::take) {
            Some(Value::Object(data)) => Ok(data),
            _ => Err(invalid()),
        }
    }
}

/// Reads a full HTTP message head from a byte stream, growing the buffer until httparse is happy.
///
/// `parse` is called on the whole buffer every time and must return the head length on success.
/// The buffer is returned along with its value.
pub(crate) fn read_head<T, H, F>(buf_reader: &mut BufReader<T>, mut parse: F) -> Result<(Vec<u8>, usize, H)>
where
    T: Read,
    F: FnMut(&[u8]) -> Result<Option<(usize, H)>>,
{
    let mut chunk = [0; 4096];
    let mut bytes = Vec::new();

    loop {
        let bytes_read = buf_reader.read(&mut chunk)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        bytes.extend_from_slice(&chunk[..bytes_read]);

        if let Some((head_len, head)) = parse(&bytes)? {
            return Ok((bytes, head_len, head));
        }
        if bytes.len() > MAX_REQUEST_SIZE {
            return Err(Error::BadRequest("Message head too large".to_string()));
        }
    }
}

/// Keeps reading until `body_len` bytes follow the head, and returns them
pub(crate) fn read_body<T>(
    buf_reader: &mut BufReader<T>,
    mut bytes: Vec<u8>,
    head_len: usize,
    body_len: usize,
) -> Result<String>
where
    T: Read,
{
    if body_len > MAX_REQUEST_SIZE {
        return Err(Error::BadRequest("Message body too large".to_string()));
    }

    let mut chunk = [0; 4096];
    // Anything past the announced body belongs to a pipelined message, which we don't support
    while bytes.len() - head_len < body_len {
        let bytes_read = buf_reader.read(&mut chunk)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        bytes.extend_from_slice(&chunk[..bytes_read]);
    }
    Ok(String::from_utf8_lossy(&bytes[head_len..head_len + body_len]).into_owned())
}

pub(crate) fn content_length(headers: &[httparse::Header]) -> usize {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("Content-Length"))
        .and_then(|length| String::from_utf8_lossy(length.value).trim().parse::<usize>().ok())
        .unwrap_or(0)
}

pub(crate) fn owned_headers(headers: &[httparse::Header]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect()
}

/// Parse an HTTP request from a byte stream
pub fn parse_request<T>(mut buf_reader: BufReader<T>) -> Result<Request>
where
    T: Read,
{
    let (bytes, head_len, (body_len, mut request)) = read_head(&mut buf_reader, |bytes| {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(bytes)? {
            httparse::Status::Complete(head_len) => {
                let request = Request {
                    method: req.method.unwrap_or("GET").to_string(),
                    path: req.path.unwrap_or("/").to_string(),
                    headers: owned_headers(req.headers),
                    body: String::new(),
                };
                Ok(Some((head_len, (content_length(req.headers), request))))
            }
            httparse::Status::Partial => Ok(None),
        }
    })?;

    request.body = read_body(&mut buf_reader, bytes, head_len, body_len)?;
    Ok(request)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    fn random_text(len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
    }

    #[test]
    fn test_parse_simple_request() {
        let req_str = b"GET /dishes HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*\r\n\r\n";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_request(buf_reader).unwrap();

        assert_eq!(parsed_req.method, "GET");
        assert_eq!(parsed_req.path, "/dishes");
        assert_eq!(parsed_req.headers.len(), 3);
        assert_eq!(parsed_req.body, "");
    }

    #[test]
    fn test_parse_incomplete_request() {
        let req_str =
            b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_request(buf_reader);

        assert!(matches!(parsed_req, Err(Error::ConnectionReset)));
    }

    #[test]
    fn test_parse_garbage() {
        let buf_reader = BufReader::new(&b"\x01\x02 nonsense\r\n\r\n"[..]);
        assert!(matches!(parse_request(buf_reader), Err(Error::Http(_))));
    }

    #[test]
    fn test_parse_request_with_body() {
        let body = r#"{ "data": { "name": "Falafel" } }"#;
        let req_str = format!(
            "POST /dishes HTTP/1.1\r\nHost: localhost:8080\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );

        let parsed_req = parse_request(BufReader::new(req_str.as_bytes())).unwrap();

        assert_eq!(parsed_req.method, "POST");
        assert_eq!(parsed_req.headers.len(), 2);
        assert_eq!(
            parsed_req.headers[1],
            ("content-length".to_string(), body.len().to_string())
        );
        assert_eq!(parsed_req.body, body);
        assert_eq!(parsed_req.data().unwrap()["name"], "Falafel");
    }

    #[test]
    fn test_parse_request_with_multibyte_body() {
        let body = "é".repeat(5000);
        let req_str = format!(
            "PUT /dishes/1 HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );

        let parsed_req = parse_request(BufReader::new(req_str.as_bytes())).unwrap();
        assert_eq!(parsed_req.body, body);
    }

    #[test]
    fn test_parse_request_with_very_large_body_and_header() {
        let body = random_text(40960);
        let x_test_header = random_text(40960);

        let req_str = format!(
            "POST / HTTP/1.1\r\nHost: localhost:8080\r\nContent-Length: {}\r\nX-TEST: {}\r\n\r\n{}",
            body.len(),
            x_test_header,
            body
        );

        let parsed_req = parse_request(BufReader::new(req_str.as_bytes())).unwrap();

        assert_eq!(parsed_req.headers.len(), 3);
        assert_eq!(parsed_req.body, body);
        assert_eq!(parsed_req.headers[2], ("X-TEST".to_string(), x_test_header));
    }

    #[test]
    fn test_oversized_body_is_refused() {
        let req_str = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_REQUEST_SIZE + 1);
        assert!(matches!(
            parse_request(BufReader::new(req_str.as_bytes())),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn test_route_path_drops_query() {
        assert_eq!(Request::get("/orders?page=2").route_path(), "/orders");
        assert_eq!(Request::get("/orders").route_path(), "/orders");
    }

    #[test]
    fn test_data_requires_object() {
        assert!(Request::post("/dishes", "not json".into()).data().is_err());
        assert!(Request::post("/dishes", r#"{"name":"x"}"#.into()).data().is_err());
        assert!(Request::post("/dishes", r#"{"data":[1]}"#.into()).data().is_err());
        assert!(Request::post("/dishes", r#"{"data":{}}"#.into()).data().unwrap().is_empty());
    }
}
