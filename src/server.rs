use std::{convert::Infallible, io, sync::Arc, time::Duration};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    header, server::conn::http1, service::service_fn, Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::{
    hyper::{content_type_from_request, map_body_stream},
    StorageEngine, UploadError, Uploader,
};

/// Upload form served at `/`.
pub const INDEX_HTML: &str = r#"<!doctype html>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Upload</title>
<style>
main { display: grid; height: 100vh; }
form { place-self: center; }
</style>
<main>
  <form enctype="multipart/form-data" action="/upload" method="post">
    <input type="file" name="file" multiple>
    <button type="submit">Upload</button>
  </form>
</main>
"#;

/// Page returned after a successful upload; sends the browser back to `/`.
pub const SUCCESS_HTML: &str = r#"<!doctype html>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<meta http-equiv="refresh" content="10;url=/">
<title>Success</title>
<style>
main { display: grid; height: 100vh; }
div { place-self: center; }
</style>
<main>
  <div>
    <p>Upload successful.</p>
    <small>Redirecting to home in 10s.</small>
  </div>
</main>
"#;

/// Pause after a failed `accept` before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Accepts connections forever, serving each on its own task.
///
/// Accept failures such as running out of file descriptors are logged and
/// retried; they never end the loop.
pub async fn serve<S>(listener: TcpListener, uploader: Arc<Uploader<S>>) -> io::Result<()>
where
    S: StorageEngine,
{
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::error!(error = %err, "server: accept failed");
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                continue;
            }
        };
        tracing::debug!(%remote_addr, "server: connection accepted");
        let uploader = Arc::clone(&uploader);

        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |request| handle(request, Arc::clone(&uploader)));

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!(%remote_addr, error = %err, "server: connection error");
            }
        });
    }
}

/// Routes one request.
pub async fn handle<B, S>(
    request: Request<B>,
    uploader: Arc<Uploader<S>>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: std::fmt::Display,
    S: StorageEngine,
{
    let response = match (request.method(), request.uri().path()) {
        (&Method::GET | &Method::HEAD, "/") => html_response(INDEX_HTML),
        (&Method::POST, "/upload") => upload(request, &uploader).await,
        (_, "/upload") => {
            let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed\n");
            response
                .headers_mut()
                .insert(header::ALLOW, header::HeaderValue::from_static("POST"));
            response
        }
        _ => text_response(StatusCode::NOT_FOUND, "not found\n"),
    };
    Ok(response)
}

async fn upload<B, S>(request: Request<B>, uploader: &Uploader<S>) -> Response<Full<Bytes>>
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: std::fmt::Display,
    S: StorageEngine,
{
    let result = match content_type_from_request(&request) {
        Ok(content_type) => {
            let content_type = content_type.map(ToOwned::to_owned);
            let body = map_body_stream(request.into_body());
            uploader.drain(content_type.as_deref(), body).await
        }
        Err(err) => Err(err.into()),
    };

    match result {
        Ok(report) => {
            tracing::debug!(files = report.files.len(), skipped = report.skipped, "upload complete");
            html_response(SUCCESS_HTML)
        }
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &UploadError) -> Response<Full<Bytes>> {
    tracing::warn!(error = %err, storage = err.is_storage(), "upload failed");
    text_response(StatusCode::BAD_REQUEST, format!("{err}\n"))
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    build_response(status, "text/plain; charset=utf-8", body.into())
}

fn html_response(body: &'static str) -> Response<Full<Bytes>> {
    build_response(StatusCode::OK, "text/html; charset=utf-8", Bytes::from_static(body.as_bytes()))
}

fn build_response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
    response
}
