//! Blocking HTTP server built on tiny_http.
//!
//! # Responsibility
//! - Bind the listener and run a fixed pool of worker threads.
//! - Read bounded request bodies and hand requests to an `HttpService`.
//! - Emit one `http_request` event per request.
//!
//! # Invariants
//! - Each worker handles one request at a time; concurrency equals the
//!   configured worker count.
//! - Dropping or shutting down the handle stops and joins every worker.

use crate::config::ServerConfig;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatus};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

#[derive(Debug)]
pub enum ServerError {
    Bind { address: String, message: String },
    Spawn(std::io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind { address, message } => {
                write!(f, "failed to bind `{address}`: {message}")
            }
            Self::Spawn(err) => write!(f, "failed to spawn server worker: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind { .. } => None,
            Self::Spawn(err) => Some(err),
        }
    }
}

/// Handle to a running server.
pub struct ServerHandle {
    server: Arc<tiny_http::Server>,
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address the listener is bound to, with the resolved port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting requests and joins every worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    /// Blocks until every worker exits.
    pub fn wait(mut self) {
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("event=server_worker module=server status=error error_code=worker_panicked");
            }
        }
    }

    fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        self.shutdown.store(true, Ordering::SeqCst);
        for _ in 0..self.workers.len() {
            self.server.unblock();
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("event=server_worker module=server status=error error_code=worker_panicked");
            }
        }
        info!(
            "event=server_stop module=server status=ok address={}",
            self.local_addr
        );
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Binds `config.address()` and starts `config.workers` worker threads.
pub fn start_server<S: HttpService>(
    config: &ServerConfig,
    service: S,
) -> Result<ServerHandle, ServerError> {
    let address = config.address();
    let server = tiny_http::Server::http(address.as_str()).map_err(|err| ServerError::Bind {
        address: address.clone(),
        message: err.to_string(),
    })?;
    let local_addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| ServerError::Bind {
            address: address.clone(),
            message: "listener is not bound to an IP address".to_string(),
        })?;

    let server = Arc::new(server);
    let service = Arc::new(service);
    let shutdown = Arc::new(AtomicBool::new(false));
    let mut handle = ServerHandle {
        server: Arc::clone(&server),
        local_addr,
        shutdown: Arc::clone(&shutdown),
        workers: Vec::with_capacity(config.workers),
    };

    for index in 0..config.workers {
        let worker = Worker {
            server: Arc::clone(&server),
            service: Arc::clone(&service),
            shutdown: Arc::clone(&shutdown),
            max_body_bytes: config.max_body_bytes,
        };
        // On spawn failure the handle's Drop stops the workers already running.
        let join = std::thread::Builder::new()
            .name(format!("http-worker-{index}"))
            .spawn(move || worker.run())
            .map_err(ServerError::Spawn)?;
        handle.workers.push(join);
    }

    info!(
        "event=server_start module=server status=ok address={} workers={}",
        local_addr, config.workers
    );
    Ok(handle)
}

struct Worker<S: HttpService> {
    server: Arc<tiny_http::Server>,
    service: Arc<S>,
    shutdown: Arc<AtomicBool>,
    max_body_bytes: usize,
}

impl<S: HttpService> Worker<S> {
    fn run(self) {
        loop {
            let request = match self.server.recv() {
                Ok(request) => request,
                Err(err) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        return;
                    }
                    warn!("event=http_accept module=server status=error error={err}");
                    continue;
                }
            };
            self.serve(request);
        }
    }

    fn serve(&self, mut request: tiny_http::Request) {
        let started_at = Instant::now();
        let method = HttpMethod::parse(&request.method().to_string());
        let target = request.url().to_string();

        let response = match read_body(&mut request, self.max_body_bytes) {
            Ok(body) => self
                .service
                .handle_request(HttpRequest::new(method.clone(), &target).with_body(body)),
            Err(BodyError::TooLarge) => HttpResponse::error(
                HttpStatus::PayloadTooLarge,
                &format!("request body exceeds {} bytes", self.max_body_bytes),
            ),
            Err(BodyError::Io(err)) => HttpResponse::error(
                HttpStatus::BadRequest,
                &format!("failed to read request body: {err}"),
            ),
        };

        let http_status = response.status().as_u16();
        let outcome = request.respond(into_tiny_response(response));
        let duration_ms = started_at.elapsed().as_millis();
        match outcome {
            Ok(()) => info!(
                "event=http_request module=server status=ok method={} path={} http_status={} duration_ms={}",
                method, target, http_status, duration_ms
            ),
            Err(err) => warn!(
                "event=http_request module=server status=error method={} path={} http_status={} duration_ms={} error={}",
                method, target, http_status, duration_ms, err
            ),
        }
    }
}

enum BodyError {
    TooLarge,
    Io(std::io::Error),
}

fn read_body(request: &mut tiny_http::Request, limit: usize) -> Result<Vec<u8>, BodyError> {
    if request.body_length().is_some_and(|length| length > limit) {
        return Err(BodyError::TooLarge);
    }

    let read_limit = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut body = Vec::new();
    request
        .as_reader()
        .take(read_limit)
        .read_to_end(&mut body)
        .map_err(BodyError::Io)?;

    if body.len() > limit {
        return Err(BodyError::TooLarge);
    }
    Ok(body)
}

fn into_tiny_response(response: HttpResponse) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let (status, headers, body) = response.into_parts();
    let mut out = tiny_http::Response::from_data(body).with_status_code(status.as_u16());
    for (name, value) in headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => warn!(
                "event=http_response module=server status=error error_code=invalid_header name={name}"
            ),
        }
    }
    out
}
