//! FFI interface for native hosts
//!
//! Exposes the three trigger entry points (scrape, clear, export) as
//! C-compatible functions. Results are JSON strings; failures come back as
//! an error message, never as a panic across the boundary.

use std::ffi::{c_char, CStr, CString};
use std::path::Path;
use std::ptr;

use serde::Serialize;

use crate::export::export_snapshot;
use crate::scrape::{scrape_page, ScrapeOptions};
use crate::sites::Registry;
use crate::store::{FileBackend, JobStore};

/// Result struct returned to the host.
/// Both pointers are owned by Rust and must be freed via `jobscrape_free_result`
#[repr(C)]
pub struct JobscrapeResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

#[derive(Serialize)]
struct ScrapeReport {
    source: String,
    batch: usize,
    new: usize,
    duplicates: usize,
    total: usize,
    skipped: usize,
    failed: usize,
}

#[derive(Serialize)]
struct ExportReport<'a> {
    exported: usize,
    path: &'a str,
}

/// Scrape a loaded page and merge its listings into the store file.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `page_url` and `store_path` must be valid null-terminated C strings
/// - Caller must free the result via `jobscrape_free_result`
#[no_mangle]
pub unsafe extern "C" fn jobscrape_scrape(
    html_ptr: *const c_char,
    html_len: usize,
    page_url: *const c_char,
    store_path: *const c_char,
) -> JobscrapeResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };
    let page_url = match read_cstr(page_url, "page url") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };
    let store_path = match read_cstr(store_path, "store path") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    let registry = match Registry::builtin() {
        Ok(r) => r,
        Err(e) => return make_error_result(&e.to_string()),
    };
    let batch = match scrape_page(html, page_url, &registry, &ScrapeOptions::default()) {
        Ok(b) => b,
        Err(e) => return make_error_result(&e.to_string()),
    };

    let store = JobStore::new(FileBackend::new(store_path));
    let skipped = batch.skipped;
    let failed = batch.failed;
    let source = batch.source;
    match store.merge_batch(batch.records) {
        Ok(stats) => make_json_result(&ScrapeReport {
            source,
            batch: stats.batch,
            new: stats.new,
            duplicates: stats.duplicates,
            total: stats.total,
            skipped,
            failed,
        }),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Replace the stored collection with an empty one.
///
/// # Safety
/// - `store_path` must be a valid null-terminated C string
/// - Caller must free the result via `jobscrape_free_result`
#[no_mangle]
pub unsafe extern "C" fn jobscrape_clear(store_path: *const c_char) -> JobscrapeResultFFI {
    let store_path = match read_cstr(store_path, "store path") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    match JobStore::new(FileBackend::new(store_path)).clear() {
        Ok(()) => make_json_result(&serde_json::json!({ "cleared": true })),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Write the stored collection to `out_path` as a JSON snapshot.
///
/// # Safety
/// - `store_path` and `out_path` must be valid null-terminated C strings
/// - Caller must free the result via `jobscrape_free_result`
#[no_mangle]
pub unsafe extern "C" fn jobscrape_export(
    store_path: *const c_char,
    out_path: *const c_char,
) -> JobscrapeResultFFI {
    let store_path = match read_cstr(store_path, "store path") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };
    let out_path = match read_cstr(out_path, "output path") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    let store = JobStore::new(FileBackend::new(store_path));
    match export_snapshot(&store, Path::new(out_path)) {
        Ok(exported) => make_json_result(&ExportReport { exported, path: out_path }),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free a result returned by any `jobscrape_*` function
///
/// # Safety
/// - `result` must have been returned by this library
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn jobscrape_free_result(result: JobscrapeResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html<'a>(html_ptr: *const c_char, html_len: usize) -> Result<&'a str, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in HTML content")
}

unsafe fn read_cstr<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{} is null", what));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 in {}", what))
}

fn make_json_result<T: Serialize>(value: &T) -> JobscrapeResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => JobscrapeResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

fn make_error_result(msg: &str) -> JobscrapeResultFFI {
    let error_cstr = CString::new(msg.replace('\0', "")).unwrap_or_default();
    JobscrapeResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(result: JobscrapeResultFFI) -> Result<serde_json::Value, String> {
        unsafe {
            let out = if !result.error_ptr.is_null() {
                Err(CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned())
            } else {
                let json = CStr::from_ptr(result.json_ptr).to_str().unwrap();
                Ok(serde_json::from_str(json).unwrap())
            };
            jobscrape_free_result(result);
            out
        }
    }

    #[test]
    fn test_scrape_clear_export_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CString::new(dir.path().join("store.json").to_str().unwrap()).unwrap();
        let out = CString::new(dir.path().join("export.json").to_str().unwrap()).unwrap();
        let page = CString::new("https://www.upwork.com/nx/search/jobs/").unwrap();
        let html = r#"<article class="job-tile">
            <h2 class="job-tile-title"><a href="/jobs/x_~01">Job</a></h2>
        </article>"#;

        let report = take(unsafe {
            jobscrape_scrape(html.as_ptr() as *const c_char, html.len(), page.as_ptr(), store.as_ptr())
        })
        .unwrap();
        assert_eq!(report["new"], 1);
        assert_eq!(report["total"], 1);
        assert_eq!(report["source"], "upwork.com");

        let exported = take(unsafe { jobscrape_export(store.as_ptr(), out.as_ptr()) }).unwrap();
        assert_eq!(exported["exported"], 1);

        let cleared = take(unsafe { jobscrape_clear(store.as_ptr()) }).unwrap();
        assert_eq!(cleared["cleared"], true);
    }

    #[test]
    fn test_errors_come_back_as_messages() {
        let dir = tempfile::tempdir().unwrap();
        let store = CString::new(dir.path().join("store.json").to_str().unwrap()).unwrap();
        let page = CString::new("https://example.com/").unwrap();

        let err = take(unsafe {
            jobscrape_scrape(ptr::null(), 0, page.as_ptr(), store.as_ptr())
        })
        .unwrap_err();
        assert!(err.contains("example.com"));

        let err = take(unsafe { jobscrape_clear(ptr::null()) }).unwrap_err();
        assert_eq!(err, "store path is null");
    }

    #[test]
    fn test_concurrent_scrapes_on_one_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("store.json");

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store_path = store_path.clone();
                std::thread::spawn(move || {
                    let store = CString::new(store_path.to_str().unwrap()).unwrap();
                    let page = CString::new("https://www.upwork.com/nx/search/jobs/").unwrap();
                    for i in 0..10 {
                        let html = format!(
                            r#"<article class="job-tile">
                                <h2 class="job-tile-title"><a href="/jobs/x_~{t}{i:02}">Job</a></h2>
                            </article>"#
                        );
                        let result = unsafe {
                            jobscrape_scrape(
                                html.as_ptr() as *const c_char,
                                html.len(),
                                page.as_ptr(),
                                store.as_ptr(),
                            )
                        };
                        take(result).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let store = JobStore::new(FileBackend::new(&store_path));
        assert_eq!(store.len().unwrap(), 80);
    }

    #[test]
    fn test_clear_recovers_garbage_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = CString::new(path.to_str().unwrap()).unwrap();

        let cleared = take(unsafe { jobscrape_clear(store.as_ptr()) }).unwrap();
        assert_eq!(cleared["cleared"], true);
        assert!(JobStore::new(FileBackend::new(&path)).is_empty().unwrap());
    }
}
