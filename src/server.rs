//! HTTP server for the admin API

use crate::router::AdminApp;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

/// Maximum accepted request body
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// HTTP/1 server wrapping an [`AdminApp`]
pub struct AdminServer {
	app: AdminApp,
}

impl AdminServer {
	pub fn new(app: AdminApp) -> Self {
		Self { app }
	}

	/// Serve until ctrl-c
	pub async fn listen(self, addr: SocketAddr) -> std::io::Result<()> {
		self.listen_with_shutdown(addr, async {
			let _ = tokio::signal::ctrl_c().await;
		})
		.await
	}

	/// Serve until `shutdown` resolves
	///
	/// New connections stop being accepted once `shutdown` completes;
	/// connections already spawned run to completion on their own tasks.
	pub async fn listen_with_shutdown<F>(self, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
	where
		F: Future<Output = ()>,
	{
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener, shutdown).await
	}

	/// Serve on an already bound listener
	pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
	where
		F: Future<Output = ()>,
	{
		tracing::info!(addr = %listener.local_addr()?, "admin server listening");
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				accepted = listener.accept() => {
					let (stream, peer) = match accepted {
						Ok(pair) => pair,
						Err(err) => {
							tracing::warn!(error = %err, "failed to accept connection");
							continue;
						}
					};
					let app = self.app.clone();
					tokio::spawn(async move {
						if let Err(err) = handle_connection(stream, peer, app).await {
							tracing::debug!(%peer, error = %err, "connection closed with error");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("admin server shutting down");
					return Ok(());
				}
			}
		}
	}
}

async fn handle_connection(
	stream: TcpStream,
	peer: SocketAddr,
	app: AdminApp,
) -> Result<(), hyper::Error> {
	let io = TokioIo::new(stream);
	let service = service_fn(move |req: Request<Incoming>| {
		let app = app.clone();
		async move { Ok::<_, Infallible>(handle_request(app, peer, req).await) }
	});
	http1::Builder::new().serve_connection(io, service).await
}

async fn handle_request(app: AdminApp, peer: SocketAddr, req: Request<Incoming>) -> Response<Full<Bytes>> {
	let (parts, body) = req.into_parts();
	let bytes = match Limited::new(body, MAX_BODY_SIZE).collect().await {
		Ok(collected) => collected.to_bytes(),
		Err(err) => {
			tracing::debug!(%peer, error = %err, "failed to read request body");
			let mut response = Response::new(Full::new(Bytes::from_static(
				b"{\"detail\":\"Request body too large or unreadable\"}",
			)));
			*response.status_mut() = StatusCode::BAD_REQUEST;
			return response;
		}
	};
	app.handle(Request::from_parts(parts, bytes)).await
}
