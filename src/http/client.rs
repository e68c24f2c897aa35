use crate::errors;
use crate::http::{parse_response, Response};
use std::io::{BufReader, Write};
use std::net::TcpStream;

/// Simple HTTP client
///
/// It sends HTTP requests from a set of parameters, then parses and yields the server response.
pub struct HttpClient {
    stream: TcpStream,
}

impl HttpClient {
    /// Create a new client connected to the given server.
    ///
    /// An error is returned if the connection cannot be made for whatever reason
    pub fn new(server: &str) -> errors::Result<Self> {
        Ok(HttpClient {
            stream: TcpStream::connect(server)?,
        })
    }

    /// Send an HTTP request on the open connection.
    ///
    /// The server answers a single request per connection: drop the client once the response is
    /// retrieved.
    pub fn send(&mut self, method: &str, endpoint: &str, body: &str) -> errors::Result<Response> {
        let content_type = if body.is_empty() {
            ""
        } else {
            "Content-Type: application/json\r\n"
        };
        self.stream.write_all(
            format! {
                "{} {} HTTP/1.1\r\n{}Content-Length: {}\r\n\r\n{}",
                method, endpoint, content_type, body.len(), body
            }
            .as_bytes(),
        )?;
        tracing::debug!(method, endpoint, "Request sent");

        let buf_reader = BufReader::new(&mut self.stream);
        parse_response(buf_reader)
    }
}
