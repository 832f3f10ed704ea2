//! Tracks the state of every asset load started by the viewer.

use super::LoadState;

#[derive(Debug)]
struct Item {
    url: String,
    state: LoadState,
    percent: Option<f64>,
}

/// Per-URL load bookkeeping, in start order.
#[derive(Debug, Default)]
pub struct LoadingManager {
    items: Vec<Item>,
    errors: Vec<String>,
}

impl LoadingManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, url: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.url == url)
    }

    /// Mark `url` as loading.
    pub fn item_start(&mut self, url: impl Into<String>) {
        let url = url.into();
        match self.slot(&url) {
            Some(item) => {
                item.state = LoadState::Loading;
                item.percent = None;
            }
            None => self.items.push(Item {
                url,
                state: LoadState::Loading,
                percent: None,
            }),
        }
    }

    /// Record download progress for `url`, in percent.
    pub fn item_progress(&mut self, url: &str, percent: f64) {
        if let Some(item) = self.slot(url) {
            item.percent = Some(percent);
        }
    }

    /// Mark `url` as loaded.
    pub fn item_end(&mut self, url: &str) {
        if let Some(item) = self.slot(url) {
            item.state = LoadState::Loaded;
        }
    }

    /// Mark `url` as failed.
    pub fn item_error(&mut self, url: &str, error: impl std::fmt::Display) {
        if let Some(item) = self.slot(url) {
            item.state = LoadState::Failed;
            self.errors.push(format!("{url}: {error}"));
        }
    }

    /// State of `url`; `Idle` if it was never started.
    pub fn item_state(&self, url: &str) -> LoadState {
        self.items
            .iter()
            .find(|item| item.url == url)
            .map_or(LoadState::Idle, |item| item.state)
    }

    /// Last reported progress of `url`, in percent.
    pub fn item_percent(&self, url: &str) -> Option<f64> {
        self.items.iter().find(|item| item.url == url).and_then(|item| item.percent)
    }

    /// URLs in the order they were started.
    pub fn started(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.url.as_str())
    }

    /// Overall state: failed if anything failed, loading while anything is in flight.
    pub fn state(&self) -> LoadState {
        if self.items.is_empty() {
            LoadState::Idle
        } else if self.items.iter().any(|item| item.state == LoadState::Failed) {
            LoadState::Failed
        } else if self.items.iter().any(|item| item.state == LoadState::Loading) {
            LoadState::Loading
        } else {
            LoadState::Loaded
        }
    }

    /// `(finished, total)` item counts.
    pub fn progress(&self) -> (usize, usize) {
        let finished = self
            .items
            .iter()
            .filter(|item| matches!(item.state, LoadState::Loaded | LoadState::Failed))
            .count();
        (finished, self.items.len())
    }

    /// Recorded error messages.
    #[inline]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut manager = LoadingManager::new();
        assert_eq!(manager.state(), LoadState::Idle);

        manager.item_start("env.hdr");
        assert_eq!(manager.state(), LoadState::Loading);
        manager.item_end("env.hdr");
        manager.item_start("model.gltf");
        manager.item_progress("model.gltf", 50.0);
        assert_eq!(manager.item_percent("model.gltf"), Some(50.0));
        assert_eq!(manager.progress(), (1, 2));
        manager.item_end("model.gltf");

        assert_eq!(manager.state(), LoadState::Loaded);
        assert_eq!(manager.started().collect::<Vec<_>>(), vec!["env.hdr", "model.gltf"]);
    }

    #[test]
    fn test_failure_is_sticky() {
        let mut manager = LoadingManager::new();
        manager.item_start("env.hdr");
        manager.item_error("env.hdr", "HTTP 404");
        assert_eq!(manager.state(), LoadState::Failed);
        assert_eq!(manager.item_state("env.hdr"), LoadState::Failed);
        assert_eq!(manager.item_state("model.gltf"), LoadState::Idle);
        assert_eq!(manager.errors(), &["env.hdr: HTTP 404".to_string()]);
    }
}
