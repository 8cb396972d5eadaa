//! Local HTTP server speaking the directory listing protocol.
//!
//! Verifies required headers and the Shared Key signature of every request,
//! pages results with numeric markers and can inject faults per directory.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use fileshare_diff::config::{AccountCredentials, API_VERSION};
use fileshare_diff::listing::RequestSigner;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Answer 500 this many times, then behave
    ServerError(usize),
    /// Answer 200 with a body that is not a listing
    Malformed,
    /// Answer 200 with a well-formed `<Error>` document, as some proxies do
    ErrorDocument,
}

#[derive(Default, Clone)]
struct Node {
    directories: Vec<String>,
    files: Vec<String>,
}

struct MockState {
    account: String,
    access_key: String,
    shares: HashMap<String, BTreeMap<String, Node>>,
    page_size: usize,
    faults: Mutex<HashMap<String, Fault>>,
    requests: AtomicUsize,
    rejected: AtomicUsize,
}

pub struct MockShareBuilder {
    account: String,
    access_key: String,
    shares: HashMap<String, BTreeMap<String, Node>>,
    page_size: usize,
    faults: HashMap<String, Fault>,
}

impl MockShareBuilder {
    pub fn share(mut self, name: &str, paths: &[&str]) -> Self {
        self.shares.insert(name.to_string(), build_tree(paths));
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn fault(mut self, directory: &str, fault: Fault) -> Self {
        self.faults.insert(directory.to_string(), fault);
        self
    }

    pub async fn start(self) -> MockShareServer {
        let state = Arc::new(MockState {
            account: self.account,
            access_key: self.access_key,
            shares: self.shares,
            page_size: self.page_size,
            faults: Mutex::new(self.faults),
            requests: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/:share", get(list_root))
            .route("/:share/*path", get(list_directory))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockShareServer {
            base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
            state,
        }
    }
}

pub struct MockShareServer {
    pub base_url: Url,
    state: Arc<MockState>,
}

impl MockShareServer {
    pub fn builder(account: &str, access_key: &str) -> MockShareBuilder {
        MockShareBuilder {
            account: account.to_string(),
            access_key: access_key.to_string(),
            shares: HashMap::new(),
            page_size: 5000,
            faults: HashMap::new(),
        }
    }

    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn rejected(&self) -> usize {
        self.state.rejected.load(Ordering::SeqCst)
    }
}

async fn list_root(
    State(state): State<Arc<MockState>>,
    Path(share): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    handle(&state, &share, String::new(), query, uri.path(), &headers)
}

async fn list_directory(
    State(state): State<Arc<MockState>>,
    Path((share, path)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let directory = format!("/{}", path.trim_start_matches('/'));
    handle(&state, &share, directory, query, uri.path(), &headers)
}

fn handle(
    state: &MockState,
    share: &str,
    directory: String,
    query: HashMap<String, String>,
    raw_path: &str,
    headers: &HeaderMap,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if let Err(reason) = check_headers(headers) {
        state.rejected.fetch_add(1, Ordering::SeqCst);
        return error(StatusCode::BAD_REQUEST, "MissingRequiredHeader", &reason);
    }
    if query.get("restype").map(String::as_str) != Some("directory")
        || query.get("comp").map(String::as_str) != Some("list")
    {
        return error(StatusCode::BAD_REQUEST, "InvalidQueryParameterValue", "restype/comp");
    }
    if !signature_matches(state, share, raw_path, &query, headers) {
        state.rejected.fetch_add(1, Ordering::SeqCst);
        return error(
            StatusCode::FORBIDDEN,
            "AuthenticationFailed",
            "The MAC signature found in the HTTP request is not the same as any computed signature.",
        );
    }

    {
        let mut faults = state.faults.lock().unwrap();
        match faults.get_mut(&directory) {
            Some(Fault::ServerError(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                return error(StatusCode::INTERNAL_SERVER_ERROR, "InternalError", "try again");
            }
            Some(Fault::Malformed) => {
                return (StatusCode::OK, "<EnumerationResults><Entries>").into_response();
            }
            Some(Fault::ErrorDocument) => {
                return error(StatusCode::OK, "ServerBusy", "come back later");
            }
            _ => {}
        }
    }

    let Some(node) = state.shares.get(share).and_then(|tree| tree.get(&directory)) else {
        return error(StatusCode::NOT_FOUND, "ResourceNotFound", &directory);
    };

    let entries: Vec<(bool, &String)> = node
        .directories
        .iter()
        .map(|d| (true, d))
        .chain(node.files.iter().map(|f| (false, f)))
        .collect();
    let start: usize = query
        .get("marker")
        .and_then(|m| m.parse::<usize>().ok())
        .unwrap_or(0)
        .min(entries.len());
    let end = (start + state.page_size).min(entries.len());

    let mut body = String::from(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    body.push_str(&format!(
        r#"<EnumerationResults ServiceEndpoint="http://mock/" ShareName="{}" DirectoryPath="{}">"#,
        escape(share),
        escape(directory.trim_start_matches('/'))
    ));
    if let Some(marker) = query.get("marker") {
        body.push_str(&format!("<Marker>{}</Marker>", escape(marker)));
    }
    body.push_str("<Entries>");
    for (is_dir, name) in &entries[start..end] {
        if *is_dir {
            body.push_str(&format!(
                "<Directory><Name>{}</Name><Properties /></Directory>",
                escape(name)
            ));
        } else {
            body.push_str(&format!(
                "<File><Name>{}</Name><Properties><Content-Length>1</Content-Length></Properties></File>",
                escape(name)
            ));
        }
    }
    body.push_str("</Entries>");
    if end < entries.len() {
        body.push_str(&format!("<NextMarker>{}</NextMarker>", end));
    } else {
        body.push_str("<NextMarker />");
    }
    body.push_str("</EnumerationResults>");

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/xml")],
        body,
    )
        .into_response()
}

fn check_headers(headers: &HeaderMap) -> Result<(), String> {
    let value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if value("x-ms-version") != Some(API_VERSION) {
        return Err("x-ms-version".into());
    }
    if value("accept") != Some("application/json") {
        return Err("accept".into());
    }
    if !value("user-agent").is_some_and(|ua| ua.starts_with("fileshare-diff/")) {
        return Err("user-agent".into());
    }
    if !value("x-ms-client-request-id").is_some_and(|id| !id.is_empty()) {
        return Err("x-ms-client-request-id".into());
    }
    if !value("x-ms-date").is_some_and(|d| d.ends_with(" GMT")) {
        return Err("x-ms-date".into());
    }
    Ok(())
}

/// Canonical resource is the account plus the path exactly as received
fn signature_matches(
    state: &MockState,
    share: &str,
    raw_path: &str,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> bool {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let credentials = AccountCredentials::new(&state.account, &state.access_key, share);
    let Ok(signer) = RequestSigner::new(&credentials) else {
        return false;
    };

    let sorted: BTreeMap<String, String> = query.clone().into_iter().collect();
    let canonical = format!("/{}{}", state.account, raw_path);
    let string_to_sign = RequestSigner::string_to_sign(
        &value("x-ms-client-request-id"),
        &value("x-ms-date"),
        &value("x-ms-version"),
        &canonical,
        &sorted,
    );

    signer.authorization(&string_to_sign) == value("authorization")
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    let body = format!(
        r#"<?xml version="1.0" encoding="utf-8"?><Error><Code>{}</Code><Message>{}</Message></Error>"#,
        code,
        escape(message)
    );
    (status, body).into_response()
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn build_tree(paths: &[&str]) -> BTreeMap<String, Node> {
    let mut tree: BTreeMap<String, Node> = BTreeMap::new();
    tree.insert(String::new(), Node::default());

    for path in paths {
        let Some(rest) = path.strip_prefix('/') else {
            tree.get_mut("").unwrap().files.push(path.to_string());
            continue;
        };
        let is_dir = rest.ends_with('/');
        let parts: Vec<&str> = rest.split('/').filter(|p| !p.is_empty()).collect();
        let dir_count = if is_dir { parts.len() } else { parts.len() - 1 };

        let mut parent = String::new();
        for part in &parts[..dir_count] {
            let child = format!("{}/{}", parent, part);
            let siblings = &mut tree.get_mut(&parent).unwrap().directories;
            if !siblings.iter().any(|d| d == part) {
                siblings.push(part.to_string());
            }
            tree.entry(child.clone()).or_default();
            parent = child;
        }
        if !is_dir {
            tree.get_mut(&parent)
                .unwrap()
                .files
                .push(parts[dir_count].to_string());
        }
    }

    tree
}
