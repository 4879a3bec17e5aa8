use crate::app::ports::{HttpClientPort, PackageStream, SourceEnumerator};
use crate::error::{ImportError, Result};
use crate::types::{ActionEnvelope, RawPackage};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PackageSearchResult {
    count: usize,
    #[serde(default)]
    results: Vec<RawPackage>,
}

/// Lists every package of a CKAN portal through `package_search`, one page at a time
pub struct CkanPackageLister {
    http: Arc<dyn HttpClientPort>,
    page_size: usize,
}

impl CkanPackageLister {
    pub fn new(http: Arc<dyn HttpClientPort>, page_size: usize) -> Self {
        Self {
            http,
            page_size: page_size.max(1),
        }
    }

    fn fetch_page(&self, base_api: &str, offset: usize) -> Result<PackageSearchResult> {
        let url = format!(
            "{}/3/action/package_search?rows={}&start={}",
            base_api, self.page_size, offset
        );
        debug!("Fetching package page: {}", url);

        let resp = self.http.get(&url).map_err(ImportError::Source)?;
        if !resp.is_success() {
            return Err(ImportError::Source(format!(
                "package_search returned HTTP {} at offset {}",
                resp.status, offset
            )));
        }

        let envelope: ActionEnvelope<PackageSearchResult> = serde_json::from_slice(&resp.bytes)
            .map_err(|e| ImportError::Source(format!("malformed package_search response: {e}")))?;
        envelope.into_result().map_err(ImportError::Source)
    }
}

impl SourceEnumerator for CkanPackageLister {
    fn list_all<'a>(&'a self, base_api: &str) -> Result<PackageStream<'a>> {
        Ok(Box::new(PackagePages {
            lister: self,
            base_api: base_api.trim_end_matches('/').to_string(),
            offset: 0,
            total: None,
            buffer: VecDeque::new(),
            done: false,
        }))
    }
}

/// Pages are fetched only once the previous page has been consumed
struct PackagePages<'a> {
    lister: &'a CkanPackageLister,
    base_api: String,
    offset: usize,
    total: Option<usize>,
    buffer: VecDeque<RawPackage>,
    done: bool,
}

impl Iterator for PackagePages<'_> {
    type Item = Result<RawPackage>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(package) = self.buffer.pop_front() {
            return Some(Ok(package));
        }
        if self.done || self.total.is_some_and(|total| self.offset >= total) {
            self.done = true;
            return None;
        }

        match self.lister.fetch_page(&self.base_api, self.offset) {
            Ok(page) => {
                self.total = Some(page.count);
                if page.results.is_empty() {
                    self.done = true;
                    return None;
                }
                self.offset += page.results.len();
                self.buffer.extend(page.results);
                self.buffer.pop_front().map(Ok)
            }
            Err(e) => {
                // A failed page ends the listing
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves `total` packages in pages, recording every requested URL
    struct PagedPortal {
        total: usize,
        requests: Mutex<Vec<String>>,
    }

    impl HttpClientPort for PagedPortal {
        fn get(&self, url: &str) -> std::result::Result<HttpGetResult, String> {
            self.requests.lock().unwrap().push(url.to_string());
            let param = |name: &str| -> usize {
                url.split(['?', '&'])
                    .find_map(|kv| kv.strip_prefix(&format!("{name}=")))
                    .and_then(|v| v.parse().ok())
                    .unwrap()
            };
            let (rows, start) = (param("rows"), param("start"));
            let results: Vec<_> = (start..(start + rows).min(self.total))
                .map(|i| json!({"id": format!("pkg-{i}"), "name": format!("n{i}"), "title": "T"}))
                .collect();
            let body = json!({"success": true, "result": {"count": self.total, "results": results}});
            Ok(HttpGetResult {
                status: 200,
                bytes: serde_json::to_vec(&body).unwrap(),
                content_type: "application/json".to_string(),
            })
        }
    }

    #[test]
    fn test_lists_all_pages_in_order() {
        let portal = Arc::new(PagedPortal {
            total: 5,
            requests: Mutex::new(Vec::new()),
        });
        let lister = CkanPackageLister::new(portal.clone(), 2);

        let ids: Vec<String> = lister
            .list_all("https://portal.example/api/")
            .unwrap()
            .map(|p| p.unwrap()["id"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(ids, vec!["pkg-0", "pkg-1", "pkg-2", "pkg-3", "pkg-4"]);
        let requests = portal.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[0],
            "https://portal.example/api/3/action/package_search?rows=2&start=0"
        );
    }

    #[test]
    fn test_pages_are_fetched_lazily() {
        let portal = Arc::new(PagedPortal {
            total: 100,
            requests: Mutex::new(Vec::new()),
        });
        let lister = CkanPackageLister::new(portal.clone(), 10);

        let first: Vec<_> = lister.list_all("https://p/api").unwrap().take(3).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(portal.requests.lock().unwrap().len(), 1);
    }

    struct FailingPortal;

    impl HttpClientPort for FailingPortal {
        fn get(&self, _url: &str) -> std::result::Result<HttpGetResult, String> {
            Ok(HttpGetResult {
                status: 503,
                bytes: Vec::new(),
                content_type: "text/plain".to_string(),
            })
        }
    }

    #[test]
    fn test_failed_page_yields_one_error_and_ends() {
        let lister = CkanPackageLister::new(Arc::new(FailingPortal), 10);
        let items: Vec<_> = lister.list_all("https://p/api").unwrap().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ImportError::Source(_))));
    }
}
