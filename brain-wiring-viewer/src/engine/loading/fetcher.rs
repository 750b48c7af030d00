//! Manifest and payload retrieval.
//!
//! Requests run off the frame loop (`spawn_local` on the web, the IO task
//! pool natively) and post their decoded results into a shared mailbox that
//! the pack loader drains once per frame. Nothing here panics or leaks an
//! error past the mailbox.

use crate::engine::assets::bundle_payload::{BundlePayload, decode_bundle_payload};
use crate::engine::assets::location::{has_scheme, with_cache_buster};
use crate::engine::assets::pack_manifest::{PackManifest, decode_manifest};
use crate::engine::error::{FetchError, PackError};
use bevy::prelude::*;
use std::sync::{Arc, Mutex};

/// Decoded result of one request.
#[derive(Debug)]
pub enum FetchedAsset {
    Manifest(Result<PackManifest, PackError>),
    BundlePayload {
        bundle_id: String,
        result: Result<BundlePayload, PackError>,
    },
}

/// One finished request, tagged with the load generation that issued it.
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub url: String,
    pub asset: FetchedAsset,
}

/// Thread-safe queue of finished requests.
#[derive(Resource, Clone, Default)]
pub struct FetchMailbox(Arc<Mutex<Vec<FetchOutcome>>>);

impl FetchMailbox {
    pub fn post(&self, outcome: FetchOutcome) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(outcome);
        }
    }

    pub fn drain(&self) -> Vec<FetchOutcome> {
        match self.0.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    }
}

/// What to request for a pack load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Manifest { path: String },
    BundlePayload { bundle_id: String, path: String },
}

/// Turn a pack path into the URL actually requested.
pub fn request_url(path: &str, cache_bust: bool, nonce: u64) -> String {
    let url = if has_scheme(path) || path.starts_with('/') {
        path.to_string()
    } else {
        platform_relative_url(path)
    };
    if cache_bust {
        with_cache_buster(&url, nonce)
    } else {
        url
    }
}

#[cfg(target_arch = "wasm32")]
fn platform_relative_url(path: &str) -> String {
    format!("{}/{}", constants::path::WEB_ASSET_ROOT, path)
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_relative_url(path: &str) -> String {
    path.to_string()
}

/// Milliseconds since the epoch mixed with the generation, unique per load.
pub fn cache_nonce(generation: u64) -> u64 {
    now_millis().wrapping_mul(1000).wrapping_add(generation % 1000)
}

#[cfg(target_arch = "wasm32")]
fn now_millis() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Fetch and decode a pack manifest.
pub async fn fetch_manifest(url: &str) -> Result<PackManifest, PackError> {
    let text = fetch_text(url).await?;
    Ok(decode_manifest(&text, url)?)
}

/// Fetch and decode one bundle's wiring payload.
pub async fn fetch_bundle_payload(url: &str) -> Result<BundlePayload, PackError> {
    let text = fetch_text(url).await?;
    Ok(decode_bundle_payload(&text, url)?)
}

/// Issue a request; its outcome lands in the mailbox.
pub fn spawn_fetch(mailbox: &FetchMailbox, generation: u64, request: FetchRequest, url: String) {
    let mailbox = mailbox.clone();
    let task = async move {
        let asset = match request {
            FetchRequest::Manifest { .. } => FetchedAsset::Manifest(fetch_manifest(&url).await),
            FetchRequest::BundlePayload { bundle_id, .. } => FetchedAsset::BundlePayload {
                bundle_id,
                result: fetch_bundle_payload(&url).await,
            },
        };
        mailbox.post(FetchOutcome {
            generation,
            url,
            asset,
        });
    };

    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(task);

    #[cfg(not(target_arch = "wasm32"))]
    bevy::tasks::IoTaskPool::get().spawn(task).detach();
}

#[cfg(target_arch = "wasm32")]
async fn fetch_response(url: &str) -> Result<web_sys::Response, FetchError> {
    use wasm_bindgen::JsCast as _;
    use web_sys::{Request, RequestInit, Response};

    let transport = |reason: String| FetchError::Transport {
        url: url.to_string(),
        reason,
    };

    let opts = RequestInit::new();
    opts.set_method("GET");

    let request =
        Request::new_with_str_and_init(url, &opts).map_err(|e| transport(format!("{e:?}")))?;
    let window = web_sys::window().ok_or_else(|| transport("no window".to_string()))?;
    let resp_value = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| transport(format!("{e:?}")))?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| transport("response is not a Response".to_string()))?;

    if !resp.ok() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: resp.status(),
        });
    }
    Ok(resp)
}

#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str) -> Result<String, FetchError> {
    let transport = |reason: String| FetchError::Transport {
        url: url.to_string(),
        reason,
    };
    let resp = fetch_response(url).await?;
    let text = wasm_bindgen_futures::JsFuture::from(
        resp.text().map_err(|e| transport(format!("{e:?}")))?,
    )
    .await
    .map_err(|e| transport(format!("{e:?}")))?;

    text.as_string()
        .ok_or_else(|| transport("body is not text".to_string()))
}

/// Raw body of an absolute URL, used by the web asset sources.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, FetchError> {
    let transport = |reason: String| FetchError::Transport {
        url: url.to_string(),
        reason,
    };
    let resp = fetch_response(url).await?;
    let buffer = wasm_bindgen_futures::JsFuture::from(
        resp.array_buffer().map_err(|e| transport(format!("{e:?}")))?,
    )
    .await
    .map_err(|e| transport(format!("{e:?}")))?;

    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Native builds read relative paths from the asset directory and use HTTP
/// only for absolute URLs. A missing file reports as 404.
#[cfg(not(target_arch = "wasm32"))]
async fn fetch_text(url: &str) -> Result<String, FetchError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return fetch_http(url);
    }

    let relative = crate::engine::assets::location::strip_query(url).trim_start_matches('/');
    let path = bevy::asset::io::file::FileAssetReader::get_base_path()
        .join("assets")
        .join(relative);

    std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FetchError::Status {
            url: url.to_string(),
            status: 404,
        },
        _ => FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        },
    })
}

/// Raw body of an absolute URL, used by the web asset sources.
#[cfg(not(target_arch = "wasm32"))]
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, FetchError> {
    http_get(url)?
        .bytes()
        .map(|body| body.to_vec())
        .map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_http(url: &str) -> Result<String, FetchError> {
    http_get(url)?.text().map_err(|e| FetchError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn http_get(url: &str) -> Result<reqwest::blocking::Response, FetchError> {
    let response = reqwest::blocking::get(url).map_err(|e| FetchError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}
