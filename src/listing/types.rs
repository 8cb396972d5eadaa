use crate::config::AccountCredentials;
use crate::listing::error::ListingResult;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use std::future::Future;

pub const MARKER_PARAM: &str = "marker";

/// Everything except RFC 3986 unreserved characters
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// One page request against a directory. Built fresh for every fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    /// Empty for the share root, otherwise `/a/b`
    pub directory_path: String,
    /// Sorted by name; the signature depends on this order
    pub query: BTreeMap<String, String>,
    /// Percent-encoded request path relative to the service URL:
    /// `/<share>[<directory>]`
    pub resource_uri: String,
    /// `/<account>` followed by `resource_uri`, exactly as sent on the wire
    pub canonical_resource: String,
}

impl ListingRequest {
    pub fn new(credentials: &AccountCredentials, directory_path: &str, marker: Option<&str>) -> Self {
        let mut query = BTreeMap::new();
        query.insert("restype".to_string(), "directory".to_string());
        query.insert("comp".to_string(), "list".to_string());
        if let Some(marker) = marker.filter(|m| !m.is_empty()) {
            query.insert(MARKER_PARAM.to_string(), marker.to_string());
        }

        // Root keeps the short form without a trailing directory component
        let mut resource_uri = format!("/{}", encode_segment(&credentials.share_name));
        for component in directory_path.split('/').filter(|c| !c.is_empty()) {
            resource_uri.push('/');
            resource_uri.push_str(&encode_segment(component));
        }
        let canonical_resource = format!("/{}{}", credentials.account_name, resource_uri);

        Self {
            directory_path: directory_path.to_string(),
            query,
            resource_uri,
            canonical_resource,
        }
    }

    pub fn is_root(&self) -> bool {
        self.directory_path.is_empty()
    }

    pub fn marker(&self) -> Option<&str> {
        self.query.get(MARKER_PARAM).map(String::as_str)
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT_ENCODE_SET).to_string()
}

/// One parsed page of a directory listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub directories: Vec<String>,
    pub files: Vec<String>,
    /// Present iff the provider has more entries for the same directory
    pub next_marker: Option<String>,
}

impl ListingPage {
    pub fn entry_count(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    pub fn has_more(&self) -> bool {
        self.next_marker.is_some()
    }
}

/// Something that can list one page of one directory.
///
/// Implementations are used from a single task at a time; the `Sync` bound
/// only lets the recursive walk hold `&Self` across awaits.
pub trait PageSource: Send + Sync {
    fn fetch_page(
        &self,
        directory_path: &str,
        marker: Option<&str>,
    ) -> impl Future<Output = ListingResult<ListingPage>> + Send;
}

/// Opens independent listing sessions, one per crawl worker.
pub trait SessionFactory: Send + Sync + 'static {
    type Session: PageSource + 'static;

    fn open_session(&self) -> ListingResult<Self::Session>;

    /// Label used in logs and crawl results
    fn describe(&self) -> (String, String);
}
