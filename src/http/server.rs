use crate::errors::{self, Error};
use crate::http::{parse_request, Request, Response};
use crate::threadpool::ThreadPool;
use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

/// Turn an HTTP status code into its reason phrase
pub fn code_to_string(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown Status",
    }
}

/// This is the main server.
///
/// It listens for incomming connections on a TCP socket, parses the requests and dispatches them
/// to a handler. Whatever the handler produces is then converted in an HTTP response and sent
/// back to the client. One request per connection.
pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    /// Create a new server listening on the given address
    pub fn new(addr: &str) -> errors::Result<Self> {
        Ok(HttpServer {
            listener: TcpListener::bind(addr)?,
        })
    }

    /// Address the server actually listens on, useful when binding port 0
    pub fn local_addr(&self) -> errors::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the server
    ///
    /// Calls the handler with the incoming requests, on a pool of `workers` threads.
    ///
    /// This function is blocking, with no real way of stopping it (except the socket being
    /// forcefully closed by the OS or the program being killed)
    pub fn serve<F>(&self, workers: usize, handler: F) -> errors::Result<()>
    where
        F: Fn(Request) -> Response + Send + Sync + 'static + Clone,
    {
        let threadpool = ThreadPool::new(workers);
        tracing::info!(
            address = %self.local_addr()?,
            workers = threadpool.size(),
            "Server listening"
        );

        for stream in self.listener.incoming() {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::warn!(%err, "Failed to accept connection");
                    continue;
                }
            };
            let handler = handler.clone();
            threadpool.execute(move || handle_stream(&mut stream, &handler))?;
        }
        Ok(())
    }

    /// Utility function for one-shot servers.
    ///
    /// This is mostly for testing, it listens to a single connection, processes the
    /// request and exit.
    pub fn serve_once<F>(&self, handler: F) -> errors::Result<()>
    where
        F: Fn(Request) -> Response,
    {
        let (mut stream, _) = self.listener.accept()?;
        handle_stream(&mut stream, &handler);
        Ok(())
    }
}

/// Parse an HTTP request from a TCP stream, calls the handler and write back the answer
fn handle_stream<F>(stream: &mut TcpStream, handler: F)
where
    F: Fn(Request) -> Response,
{
    let peer = stream.peer_addr().ok();
    let response = match parse_request(BufReader::new(&mut *stream)) {
        Ok(request) => {
            let span = tracing::info_span!("request", method = %request.method, path = %request.path);
            let _guard = span.enter();
            let response = handler(request);
            tracing::info!(status = response.status.unwrap_or(500), "Handled");
            response
        }
        Err(Error::ConnectionReset) => {
            tracing::debug!(?peer, "Connection closed before a full request was read");
            return;
        }
        Err(err) => {
            tracing::warn!(?peer, %err, "Unparseable request");
            Response::bare_error(400)
        }
    };
    respond(stream, response);
}

/// Writes an HTTP response to a stream
fn respond(stream: &mut TcpStream, resp: Response) {
    let status = resp.status.unwrap_or(500);
    let result = stream.write_all(
        format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n{}\r\n{}",
            status,
            code_to_string(status),
            resp.body.len(),
            resp.headers
                .iter()
                .map(|(k, v)| format!["{}: {}\r\n", k, v])
                .collect::<Vec<_>>()
                .join(""),
            resp.body
        )
        .as_bytes(),
    );

    if let Err(err) = result {
        tracing::error!(%err, "Failed to respond");
    }
}
