//! Background image loading for the fog overlay.
//!
//! Loads run off the render loop and are polled once per frame. There is no
//! cancellation: every load that completes is applied in completion order,
//! so the most recently completed load wins, even if it was started before
//! a newer one that is still in flight.

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures_lite::future;
use image::RgbaImage;
use std::future::Future;
use std::pin::Pin;

use crate::error::{FogError, Result};

pub type ImageLoadFuture = Pin<Box<dyn Future<Output = Result<RgbaImage>> + Send + Sync>>;

/// Image loading capability
pub trait ImageLoader {
    fn load(&self, path: &str) -> ImageLoadFuture;
}

/// Decodes images from disk on the IO task pool
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageLoader;

impl ImageLoader for FileImageLoader {
    fn load(&self, path: &str) -> ImageLoadFuture {
        let path = path.to_string();
        let task = IoTaskPool::get().spawn(async move {
            image::open(&path)
                .map(|img| img.to_rgba8())
                .map_err(|source| FogError::ImageLoad { path, source })
        });
        Box::pin(task)
    }
}

struct PendingLoad {
    path: String,
    future: ImageLoadFuture,
}

/// Loads started but not yet completed
#[derive(Default)]
pub struct PendingImageLoads {
    loads: Vec<PendingLoad>,
}

impl PendingImageLoads {
    pub fn start(&mut self, loader: &dyn ImageLoader, path: &str) {
        debug!("Loading fog image {}", path);
        self.loads.push(PendingLoad {
            path: path.to_string(),
            future: loader.load(path),
        });
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Drop every in-flight load without applying it
    pub fn cancel_all(&mut self) {
        self.loads.clear();
    }

    /// Poll every pending load once and return the completed ones in
    /// completion order. Failed loads are logged and dropped.
    pub fn poll(&mut self) -> Vec<(String, RgbaImage)> {
        let mut completed = Vec::new();
        self.loads.retain_mut(|load| {
            match future::block_on(future::poll_once(&mut load.future)) {
                Some(Ok(image)) => {
                    info!(
                        "Loaded fog image {} ({}x{})",
                        load.path,
                        image.width(),
                        image.height()
                    );
                    completed.push((load.path.clone(), image));
                    false
                }
                Some(Err(e)) => {
                    warn!("{}", e);
                    false
                }
                None => true,
            }
        });
        completed
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ManualLoader;
    use super::*;

    #[test]
    fn test_pending_until_complete() {
        let loader = ManualLoader::default();
        let mut pending = PendingImageLoads::default();
        pending.start(&loader, "a.png");

        assert!(pending.poll().is_empty());
        assert_eq!(pending.len(), 1);

        loader.complete("a.png", [255, 0, 0, 255]);
        let done = pending.poll();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].0, "a.png");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_failed_load_is_dropped() {
        let loader = ManualLoader::default();
        let mut pending = PendingImageLoads::default();
        pending.start(&loader, "missing.png");

        loader.fail("missing.png");
        assert!(pending.poll().is_empty());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_completions_in_completion_order() {
        let loader = ManualLoader::default();
        let mut pending = PendingImageLoads::default();
        pending.start(&loader, "old.png");
        pending.start(&loader, "new.png");

        loader.complete("new.png", [0, 255, 0, 255]);
        let first = pending.poll();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].0, "new.png");

        loader.complete("old.png", [255, 0, 0, 255]);
        let second = pending.poll();
        assert_eq!(second[0].0, "old.png");
    }

    #[test]
    fn test_cancel_all() {
        let loader = ManualLoader::default();
        let mut pending = PendingImageLoads::default();
        pending.start(&loader, "a.png");
        pending.cancel_all();
        loader.complete("a.png", [0, 0, 0, 255]);
        assert!(pending.poll().is_empty());
    }
}
