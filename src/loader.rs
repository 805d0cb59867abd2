use crate::error::DashboardError;
use crate::types::{CaseRecord, CaseTable, CATEGORY, RECEIVED_DATE, RECEIVED_FROM};
use crate::util::parse_date_safe;
use csv::{ReaderBuilder, StringRecord};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/1oKRoX6fYVy9xJ1l0irr37s6O6YTMbUWIqXcvbyGjUNE/export?format=csv";

// Loaded tables, keyed by source. Written once per source, read-only after.
static TABLE_CACHE: Lazy<Mutex<HashMap<String, Arc<CaseTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Where the CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// `http://` and `https://` locations are fetched, anything else is a path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::File(PathBuf::from(location))
        }
    }

    fn cache_key(&self) -> String {
        match self {
            Source::Url(url) => url.clone(),
            Source::File(path) => format!("file:{}", path.display()),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{}", url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub timeout: Duration,
    pub date_formats: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            date_formats: crate::util::default_date_formats(),
        }
    }
}

/// Load the case table for `source`, reusing the cached copy when this
/// source was already loaded in this process.
pub fn load_cases(source: &Source, opts: &LoadOptions) -> Result<Arc<CaseTable>, DashboardError> {
    let key = source.cache_key();
    {
        let cache = TABLE_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(table) = cache.get(&key) {
            debug!(source = %source, rows = table.len(), "reusing cached case table");
            return Ok(Arc::clone(table));
        }
    }

    let body = fetch_csv(source, opts.timeout)?;
    let table = Arc::new(parse_cases(body.as_bytes(), &opts.date_formats)?);
    match table.date_span() {
        Some((first, last)) => info!(
            source = %source,
            rows = table.len(),
            columns = table.headers.len(),
            first = %first,
            last = %last,
            "loaded case table"
        ),
        None => info!(source = %source, columns = table.headers.len(), "loaded empty case table"),
    }

    let mut cache = TABLE_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    let cached = cache.entry(key).or_insert(table);
    Ok(Arc::clone(cached))
}

/// Fetch the raw CSV text.
pub fn fetch_csv(source: &Source, timeout: Duration) -> Result<String, DashboardError> {
    match source {
        Source::Url(url) => {
            info!(url = %url, "fetching case data");
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| DashboardError::fetch(url, e))?;
            let resp = client.get(url).send().map_err(|e| DashboardError::fetch(url, e))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(DashboardError::fetch(url, format!("server returned {}", status)));
            }
            resp.text().map_err(|e| DashboardError::fetch(url, e))
        }
        Source::File(path) => {
            debug!(path = %path.display(), "reading case data");
            std::fs::read_to_string(path)
                .map_err(|e| DashboardError::fetch(&path.display().to_string(), e))
        }
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, DashboardError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| DashboardError::DataFormat(format!("missing required column '{}'", name)))
}

/// Parse CSV text into a case table.
///
/// Every row must carry a parseable `Received Date`; the first row that
/// doesn't fails the whole load. Other columns are kept as-is.
pub fn parse_cases<R: Read>(reader: R, date_formats: &[String]) -> Result<CaseTable, DashboardError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| DashboardError::DataFormat(e.to_string()))?
        .clone();

    let date_idx = column_index(&headers, RECEIVED_DATE)?;
    let category_idx = column_index(&headers, CATEGORY)?;
    let partner_idx = column_index(&headers, RECEIVED_FROM)?;

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        // Header is line 1, first data row is line 2.
        let line = i + 2;
        let row = result.map_err(|e| DashboardError::DataFormat(e.to_string()))?;
        let raw_date = row.get(date_idx);
        let received_date = parse_date_safe(raw_date, date_formats).ok_or_else(|| {
            DashboardError::DataFormat(format!(
                "line {}: cannot parse '{}' value {:?}",
                line,
                RECEIVED_DATE,
                raw_date.unwrap_or("")
            ))
        })?;
        records.push(CaseRecord {
            received_date,
            category: row.get(category_idx).unwrap_or("").to_string(),
            received_from: row.get(partner_idx).unwrap_or("").to_string(),
            fields: row,
        });
    }

    Ok(CaseTable::new(headers, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::default_date_formats;
    use chrono::NaiveDate;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answer a single HTTP request on 127.0.0.1 with `response`.
    fn serve_once(response: String) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/export.csv", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        (url, handle)
    }

    const SAMPLE: &str = "\
Case No,Received Date,Category,Received From,Notes
C-1,2023-01-15,A,X,first
C-2,2023-02-10,B,Y,\"comma, inside\"
C-3,1/5/2024,A,X,
";

    #[test]
    fn parses_rows_and_keeps_extra_columns() {
        let table = parse_cases(SAMPLE.as_bytes(), &default_date_formats()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.headers.len(), 5);
        let second = &table.records[1];
        assert_eq!(second.received_date, NaiveDate::from_ymd_opt(2023, 2, 10).unwrap());
        assert_eq!(second.category, "B");
        assert_eq!(second.received_from, "Y");
        assert_eq!(second.fields.get(0), Some("C-2"));
        assert_eq!(second.fields.get(4), Some("comma, inside"));
        assert_eq!(
            table.records[2].received_date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
    }

    #[test]
    fn missing_column_is_format_error() {
        let csv = "Received Date,Category\n2023-01-15,A\n";
        let err = parse_cases(csv.as_bytes(), &default_date_formats()).unwrap_err();
        match err {
            DashboardError::DataFormat(msg) => assert!(msg.contains("Received From")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let csv = "received date,Category,Received From\n2023-01-15,A,X\n";
        assert!(matches!(
            parse_cases(csv.as_bytes(), &default_date_formats()),
            Err(DashboardError::DataFormat(_))
        ));
    }

    #[test]
    fn unparseable_date_fails_the_load() {
        let csv = "Received Date,Category,Received From\n2023-01-15,A,X\nsoon,B,Y\n";
        let err = parse_cases(csv.as_bytes(), &default_date_formats()).unwrap_err();
        match err {
            DashboardError::DataFormat(msg) => assert!(msg.contains("line 3")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn header_only_gives_empty_table() {
        let csv = "Received Date,Category,Received From\n";
        let table = parse_cases(csv.as_bytes(), &default_date_formats()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn source_parse_distinguishes_urls_and_paths() {
        assert_eq!(
            Source::parse("https://example.com/x.csv"),
            Source::Url("https://example.com/x.csv".to_string())
        );
        assert_eq!(Source::parse("data/cases.csv"), Source::File(PathBuf::from("data/cases.csv")));
    }

    #[test]
    fn file_source_is_loaded_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let source = Source::File(file.path().to_path_buf());

        let first = load_cases(&source, &LoadOptions::default()).unwrap();
        // Changing the file afterwards must not matter; the cached table wins.
        std::fs::write(file.path(), "garbage").unwrap();
        let second = load_cases(&source, &LoadOptions::default()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::File(dir.path().join("nope.csv"));
        assert!(matches!(
            load_cases(&source, &LoadOptions::default()),
            Err(DashboardError::DataFetch { .. })
        ));
    }

    #[test]
    fn url_not_found_is_fetch_error() {
        let (url, server) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        );
        let err = fetch_csv(&Source::Url(url.clone()), Duration::from_secs(5)).unwrap_err();
        server.join().unwrap();
        match err {
            DashboardError::DataFetch { location, reason } => {
                assert_eq!(location, url);
                assert!(reason.contains("404"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn url_source_is_fetched_and_parsed() {
        let (url, server) = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            SAMPLE.len(),
            SAMPLE
        ));
        let table = load_cases(&Source::Url(url), &LoadOptions::default()).unwrap();
        server.join().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records[0].category, "A");
    }
}
