//! Byte sources for model files.

use std::collections::HashMap;

use super::{LoadError, ProgressObserver};
use crate::progress::LoadProgress;

#[cfg(not(target_arch = "wasm32"))]
const READ_CHUNK: usize = 64 * 1024;

/// Fetches a whole file, reporting progress per received chunk.
#[allow(async_fn_in_trait)]
pub trait AssetFetcher {
    /// Fetch `path`, calling `observer` after each chunk.
    ///
    /// # Errors
    ///
    /// [`LoadError::Transfer`] if the file cannot be read or downloaded.
    async fn fetch(
        &self,
        path: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<u8>, LoadError>;
}

/// Fetcher over files held in memory, delivered in fixed-size chunks.
#[derive(Debug, Clone)]
pub struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
    chunk_size: usize,
}

impl Default for MemoryFetcher {
    fn default() -> Self {
        Self {
            files: HashMap::new(),
            chunk_size: 64 * 1024,
        }
    }
}

impl MemoryFetcher {
    /// Fetcher with no files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `path`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let _ = self.files.insert(path.into(), bytes);
        self
    }

    /// Deliver files in chunks of `chunk_size` bytes (at least one).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl AssetFetcher for MemoryFetcher {
    async fn fetch(
        &self,
        path: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<u8>, LoadError> {
        let bytes = self
            .files
            .get(path)
            .ok_or_else(|| LoadError::Transfer(format!("{path}: not found")))?;
        let total = bytes.len() as u64;
        let mut loaded = 0u64;
        for chunk in bytes.chunks(self.chunk_size) {
            loaded += chunk.len() as u64;
            observer.on_progress(LoadProgress::new(loaded, total));
        }
        Ok(bytes.clone())
    }
}

/// Reads local files.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[cfg(not(target_arch = "wasm32"))]
impl AssetFetcher for FileFetcher {
    async fn fetch(
        &self,
        path: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<u8>, LoadError> {
        let transfer = |e: std::io::Error| LoadError::Transfer(format!("{path}: {e}"));
        let file = std::fs::File::open(path).map_err(transfer)?;
        let total = file.metadata().map(|m| m.len()).unwrap_or(0);
        read_chunked(file, total, observer).map_err(transfer)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read_chunked(
    mut reader: impl std::io::Read,
    total: u64,
    observer: &mut dyn ProgressObserver,
) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        bytes.extend_from_slice(&chunk[..n]);
        observer.on_progress(LoadProgress::new(bytes.len() as u64, total));
    }
    Ok(bytes)
}

/// Downloads over HTTP(S), streaming the body.
#[cfg(any(feature = "viewer", all(feature = "web", target_arch = "wasm32")))]
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

#[cfg(all(feature = "viewer", not(target_arch = "wasm32")))]
impl AssetFetcher for HttpFetcher {
    async fn fetch(
        &self,
        path: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<u8>, LoadError> {
        let mut response = ureq::get(path)
            .call()
            .map_err(|e| LoadError::Transfer(format!("{path}: {e}")))?;
        let total = response.body().content_length().unwrap_or(0);
        read_chunked(response.body_mut().as_reader(), total, observer)
            .map_err(|e| LoadError::Transfer(format!("{path}: {e}")))
    }
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
impl AssetFetcher for HttpFetcher {
    async fn fetch(
        &self,
        path: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<u8>, LoadError> {
        web_fetch::fetch(path, observer)
            .await
            .map_err(|e| LoadError::Transfer(format!("{path}: {e:?}")))
    }
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web_fetch {
    use js_sys::{Reflect, Uint8Array};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{ReadableStreamDefaultReader, Response};

    use super::ProgressObserver;
    use crate::progress::LoadProgress;

    pub(super) async fn fetch(
        path: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<u8>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let response: Response = JsFuture::from(window.fetch_with_str(path))
            .await?
            .dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!(
                "HTTP {} {}",
                response.status(),
                response.status_text()
            )));
        }
        let total = response
            .headers()
            .get("content-length")?
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let Some(body) = response.body() else {
            let buffer = JsFuture::from(response.array_buffer()?).await?;
            let bytes = Uint8Array::new(&buffer).to_vec();
            observer.on_progress(LoadProgress::new(bytes.len() as u64, total));
            return Ok(bytes);
        };

        let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();
        let mut bytes = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
        loop {
            let step = JsFuture::from(reader.read()).await?;
            if Reflect::get(&step, &JsValue::from_str("done"))?.is_truthy() {
                break;
            }
            let value = Reflect::get(&step, &JsValue::from_str("value"))?;
            let chunk: Uint8Array = value.dyn_into()?;
            let start = bytes.len();
            bytes.resize(start + chunk.length() as usize, 0);
            chunk.copy_to(&mut bytes[start..]);
            observer.on_progress(LoadProgress::new(bytes.len() as u64, total));
        }
        Ok(bytes)
    }
}

/// Local files, or HTTP(S) URLs when the `viewer` feature is on.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFetcher;

#[cfg(not(target_arch = "wasm32"))]
impl AssetFetcher for NativeFetcher {
    async fn fetch(
        &self,
        path: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<u8>, LoadError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            #[cfg(feature = "viewer")]
            return HttpFetcher.fetch(path, observer).await;
            #[cfg(not(feature = "viewer"))]
            return Err(LoadError::Transfer(format!(
                "{path}: HTTP support requires the `viewer` feature"
            )));
        }
        FileFetcher.fetch(path, observer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_fetcher_reports_each_chunk_in_order() {
        let fetcher = MemoryFetcher::new()
            .with_file("a.bin", vec![7u8; 10])
            .with_chunk_size(4);
        let mut seen = Vec::new();
        let bytes = pollster::block_on(fetcher.fetch("a.bin", &mut |p: LoadProgress| {
            seen.push(p)
        }))
        .unwrap();
        assert_eq!(bytes.len(), 10);
        assert_eq!(
            seen,
            vec![
                LoadProgress::new(4, 10),
                LoadProgress::new(8, 10),
                LoadProgress::new(10, 10),
            ]
        );
    }

    #[test]
    fn file_fetcher_reads_whole_file() {
        let path = std::env::temp_dir().join("modelview_fetch_test.bin");
        std::fs::write(&path, vec![1u8; READ_CHUNK + 10]).unwrap();
        let mut last = None;
        let bytes = pollster::block_on(
            FileFetcher.fetch(path.to_str().unwrap(), &mut |p: LoadProgress| last = Some(p)),
        )
        .unwrap();
        assert_eq!(bytes.len(), READ_CHUNK + 10);
        let last = last.unwrap();
        assert!(last.is_complete());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_local_file_is_transfer_error() {
        let err = pollster::block_on(
            NativeFetcher.fetch("/definitely/not/here.glb", &mut |_: LoadProgress| {}),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Transfer(msg) if msg.contains("not/here.glb")));
    }
}
