use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full, StreamBody};
use hyper::{body::Frame, Method, StatusCode, Uri};
#[cfg(not(feature = "rustls-platform-verifier"))]
use hyper_rustls::ConfigBuilderExt;
use hyper_util::{
    client::legacy::{
        connect::{Connect, HttpConnector},
        Client,
    },
    rt::TokioExecutor,
};
use once_cell::sync::Lazy;
use rustls::ClientConfig;
#[cfg(feature = "rustls-platform-verifier")]
use rustls_platform_verifier::BuilderVerifierExt;
use std::{collections::HashMap, convert::Infallible, fmt, path::Path};
use tokio_util::io::ReaderStream;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request body accepted by every helper in this module.
pub type HttpBody = UnsyncBoxBody<Bytes, BoxError>;

#[derive(Debug)]
pub struct ResponseData {
    pub status: u16,
    pub body: Option<Bytes>,
}

impl ResponseData {
    /// Canonical reason phrase for the status code, if it has one.
    pub fn reason(&self) -> &'static str {
        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("")
    }

    pub fn body_text(&self) -> String {
        self.body
            .as_ref()
            .map_or_else(String::new, |body| String::from_utf8_lossy(body).to_string())
    }
}

impl fmt::Display for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response status: {}, body: {}",
            self.status,
            self.body_text()
        )
    }
}

pub fn empty_body() -> HttpBody {
    Empty::<Bytes>::new()
        .map_err(|never: Infallible| -> BoxError { match never {} })
        .boxed_unsync()
}

pub fn full_body(data: impl Into<Bytes>) -> HttpBody {
    Full::new(data.into())
        .map_err(|never: Infallible| -> BoxError { match never {} })
        .boxed_unsync()
}

/// Opens `path` as a streaming request body, returning it with the file length
/// so the caller can declare `Content-Length` up front.
pub async fn file_body(path: &Path) -> std::io::Result<(HttpBody, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    let stream = ReaderStream::new(file)
        .map_ok(Frame::data)
        .map_err(|e| -> BoxError { Box::new(e) });
    Ok((StreamBody::new(stream).boxed_unsync(), len))
}

pub async fn get(
    url: Uri,
    header_map: &HashMap<String, String>,
) -> Result<ResponseData, BoxError> {
    request(Method::GET, url, header_map, empty_body(), false).await
}

pub async fn head(
    url: Uri,
    header_map: &HashMap<String, String>,
) -> Result<ResponseData, BoxError> {
    request(Method::HEAD, url, header_map, empty_body(), true).await
}

/// Sends a single request and collects the response. Redirects are not
/// followed. With `only_status` the response body is left unread.
pub async fn request(
    method: Method,
    url: Uri,
    header_map: &HashMap<String, String>,
    body: HttpBody,
    only_status: bool,
) -> Result<ResponseData, BoxError> {
    let https = url.scheme_str() == Some("https");
    let mut req = hyper::Request::builder().method(method).uri(url);
    for (key, value) in header_map {
        req = req.header(key, value);
    }
    let req = req.body(body)?;

    if https {
        let client = Client::builder(TokioExecutor::new()).build(https_config()?);
        send(client, req, only_status).await
    } else {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        send(client, req, only_status).await
    }
}

async fn send<C>(
    client: Client<C, HttpBody>,
    req: hyper::Request<HttpBody>,
    only_status: bool,
) -> Result<ResponseData, BoxError>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    let mut res = client.request(req).await?;
    let status = res.status();
    if only_status {
        return Ok(ResponseData {
            status: status.as_u16(),
            body: None,
        });
    }
    let mut body = BytesMut::new();
    while let Some(next) = res.frame().await {
        let frame = next?;
        if let Some(chunk) = frame.data_ref() {
            body.extend_from_slice(chunk);
        }
    }
    Ok(ResponseData {
        status: status.as_u16(),
        body: Some(body.freeze()),
    })
}

static PROVIDER: Lazy<std::sync::Arc<rustls::crypto::CryptoProvider>> =
    Lazy::new(|| std::sync::Arc::new(rustls::crypto::ring::default_provider()));

struct HttpsConfigError {
    error: BoxError,
}

impl fmt::Display for HttpsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HttpsConfigError: {}", self.error)
    }
}

impl fmt::Debug for HttpsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HttpsConfigError: {:?}", self.error)
    }
}

impl std::error::Error for HttpsConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

fn https_config() -> Result<hyper_rustls::HttpsConnector<HttpConnector>, HttpsConfigError> {
    let provider = PROVIDER.clone();
    let tls: ClientConfig;
    #[cfg(feature = "rustls-platform-verifier")]
    {
        tls = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| HttpsConfigError { error: Box::new(e) })?
            .with_platform_verifier()
            .map_err(|e| HttpsConfigError { error: Box::new(e) })?
            .with_no_client_auth();
    }
    #[cfg(all(feature = "webpki-roots", not(feature = "rustls-platform-verifier")))]
    {
        tls = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| HttpsConfigError { error: Box::new(e) })?
            .with_webpki_roots()
            .with_no_client_auth();
    }
    #[cfg(all(
        feature = "native-tokio",
        not(feature = "webpki-roots"),
        not(feature = "rustls-platform-verifier")
    ))]
    {
        tls = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| HttpsConfigError { error: Box::new(e) })?
            .with_native_roots()
            .map_err(|e| HttpsConfigError { error: Box::new(e) })?
            .with_no_client_auth();
    }
    #[cfg(all(
        not(feature = "native-tokio"),
        not(feature = "webpki-roots"),
        not(feature = "rustls-platform-verifier")
    ))]
    {
        compile_error!("No TLS backend enabled");
    }
    Ok(hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build())
}

pub fn http_status_is_ok(status: u16) -> bool {
    if let Ok(status) = StatusCode::from_u16(status) {
        !(status.is_client_error() || status.is_server_error())
    } else {
        false
    }
}
