//! Processed-image cache.
//!
//! Filters run at the natural resolution of the source and are the only
//! expensive step of a redraw. The cache keeps the single most recent result
//! and reuses it while the filter fingerprint and the source allocation stay
//! the same. Zoom, pan, rotation and flips are applied downstream at draw
//! time and never invalidate it.

use std::rc::Rc;

use crate::decode::ImageAsset;
use crate::filter::FilterChain;
use crate::state::AdjustmentState;

#[derive(Debug)]
struct CacheEntry {
    fingerprint: String,
    source: Rc<ImageAsset>,
    bitmap: Rc<ImageAsset>,
}

/// Single-entry cache of the filtered bitmap.
#[derive(Debug, Default)]
pub struct ProcessedImageCache {
    entry: Option<CacheEntry>,
    render_count: u64,
}

impl ProcessedImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the filtered bitmap for `source` under `state`.
    ///
    /// # Arguments
    ///
    /// * `source` - The current image asset
    /// * `state` - Adjustments; only the filter fields take part in the key
    ///
    /// # Returns
    ///
    /// The cached bitmap when the filter fingerprint matches and `source` is
    /// the same allocation as the cached source, otherwise a freshly
    /// processed bitmap which replaces the entry.
    pub fn get_processed(&mut self, source: &Rc<ImageAsset>, state: &AdjustmentState) -> Rc<ImageAsset> {
        let params = state.filter_params();
        let fingerprint = params.fingerprint();

        if let Some(entry) = &self.entry {
            if entry.fingerprint == fingerprint && Rc::ptr_eq(&entry.source, source) {
                return Rc::clone(&entry.bitmap);
            }
        }

        let chain = FilterChain::from_params(&params);
        let bitmap = if chain.is_identity() {
            // Identity filters share the source allocation.
            Rc::clone(source)
        } else {
            Rc::new(chain.apply(source))
        };
        self.render_count += 1;

        tracing::debug!(
            width = source.width,
            height = source.height,
            filters = %chain.to_css(),
            renders = self.render_count,
            "processed image cache miss"
        );

        self.entry = Some(CacheEntry {
            fingerprint,
            source: Rc::clone(source),
            bitmap: Rc::clone(&bitmap),
        });
        bitmap
    }

    /// Number of times the filters have been applied since creation.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Drop the cached entry so the next lookup recomputes.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_warm(&self) -> bool {
        self.entry.is_some()
    }
}
