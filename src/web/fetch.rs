//! `fetch`-backed asset source with streamed download progress.

use crate::loaders::{AssetSource, LoadError, LoadProgress};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{ReadableStreamDefaultReader, Response};

fn fetch_error(url: &str, err: JsValue) -> LoadError {
    LoadError::Fetch {
        url: url.to_string(),
        message: format!("{:?}", err),
    }
}

/// Fetches assets with `window.fetch`.
///
/// When the response has a body stream it is read chunk by chunk and
/// progress is reported against `Content-Length`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchSource;

impl FetchSource {
    /// Create a source.
    pub fn new() -> Self {
        Self
    }
}

impl AssetSource for FetchSource {
    async fn fetch(&self, url: &str, on_progress: &mut dyn FnMut(&LoadProgress)) -> Result<Vec<u8>, LoadError> {
        let window = web_sys::window().ok_or_else(|| LoadError::Fetch {
            url: url.to_string(),
            message: "no window object".into(),
        })?;

        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| fetch_error(url, e))?
            .dyn_into()
            .map_err(|e| fetch_error(url, e))?;

        if !response.ok() {
            return Err(LoadError::Http {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let total = response
            .headers()
            .get("content-length")
            .ok()
            .flatten()
            .and_then(|len| len.parse::<u64>().ok());

        let Some(body) = response.body() else {
            let buffer = response.array_buffer().map_err(|e| fetch_error(url, e))?;
            let buffer = JsFuture::from(buffer).await.map_err(|e| fetch_error(url, e))?;
            let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
            on_progress(&LoadProgress::new(url, bytes.len() as u64, total.or(Some(bytes.len() as u64))));
            return Ok(bytes);
        };

        let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();
        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        loop {
            let chunk = JsFuture::from(reader.read()).await.map_err(|e| fetch_error(url, e))?;
            let done = js_sys::Reflect::get(&chunk, &JsValue::from_str("done"))
                .map_err(|e| fetch_error(url, e))?
                .as_bool()
                .unwrap_or(true);
            if done {
                break;
            }
            let value = js_sys::Reflect::get(&chunk, &JsValue::from_str("value")).map_err(|e| fetch_error(url, e))?;
            bytes.extend(js_sys::Uint8Array::new(&value).to_vec());
            on_progress(&LoadProgress::new(url, bytes.len() as u64, total));
        }

        log::debug!("fetched {} ({} bytes)", url, bytes.len());
        Ok(bytes)
    }
}
