//! Pager configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_FETCH_SIZE: usize = 20;
pub const DEFAULT_INITIAL_PAGE: usize = 1;

/// Page geometry and behavior of a paged table.
///
/// `page_size` is the number of rows shown per display page and
/// `fetch_size` the number of rows requested per remote call. The fetch
/// size must be a whole multiple of the page size so that every block
/// splits into complete display pages.
///
/// Can be embedded in an application settings file:
///
/// ```toml
/// page_size = 25
/// fetch_size = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerConfig {
    pub page_size: usize,
    pub fetch_size: usize,
    pub initial_page: usize,
    /// Fetch the next block in the background when the last page of a
    /// block is shown.
    pub prefetch: bool,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fetch_size: DEFAULT_FETCH_SIZE,
            initial_page: DEFAULT_INITIAL_PAGE,
            prefetch: true,
        }
    }
}

impl PagerConfig {
    pub fn new(page_size: usize, fetch_size: usize) -> Self {
        Self {
            page_size,
            fetch_size,
            ..Default::default()
        }
    }

    pub fn with_initial_page(mut self, page: usize) -> Self {
        self.initial_page = page;
        self
    }

    pub fn with_prefetch(mut self, enabled: bool) -> Self {
        self.prefetch = enabled;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|source| ConfigError::Toml { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the geometry invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.fetch_size == 0 {
            return Err(ConfigError::ZeroFetchSize);
        }
        if self.fetch_size < self.page_size {
            return Err(ConfigError::FetchSmallerThanPage {
                page_size: self.page_size,
                fetch_size: self.fetch_size,
            });
        }
        if self.fetch_size % self.page_size != 0 {
            return Err(ConfigError::FetchNotMultiple {
                page_size: self.page_size,
                fetch_size: self.fetch_size,
            });
        }
        if self.initial_page == 0 {
            return Err(ConfigError::ZeroInitialPage);
        }
        Ok(())
    }

    /// Display pages covered by one remote call.
    #[inline]
    pub fn pages_per_block(&self) -> usize {
        (self.fetch_size / self.page_size.max(1)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PagerConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.fetch_size, 20);
        assert_eq!(config.initial_page, 1);
        assert!(config.prefetch);
        assert!(config.validate().is_ok());
        assert_eq!(config.pages_per_block(), 2);
    }

    #[test]
    fn test_rejects_fetch_smaller_than_page() {
        let err = PagerConfig::new(20, 10).validate().unwrap_err();
        assert!(matches!(err, ConfigError::FetchSmallerThanPage { .. }));
    }

    #[test]
    fn test_rejects_non_multiple() {
        let err = PagerConfig::new(10, 25).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FetchNotMultiple {
                page_size: 10,
                fetch_size: 25
            }
        ));
    }

    #[test]
    fn test_rejects_zero_sizes() {
        assert!(matches!(
            PagerConfig::new(0, 10).validate(),
            Err(ConfigError::ZeroPageSize)
        ));
        assert!(matches!(
            PagerConfig::new(10, 0).validate(),
            Err(ConfigError::ZeroFetchSize)
        ));
        assert!(matches!(
            PagerConfig::default().with_initial_page(0).validate(),
            Err(ConfigError::ZeroInitialPage)
        ));
    }

    #[test]
    fn test_equal_sizes_are_one_page_per_block() {
        let config = PagerConfig::new(15, 15);
        assert!(config.validate().is_ok());
        assert_eq!(config.pages_per_block(), 1);
    }

    #[test]
    fn test_from_toml_fills_defaults() {
        let config = PagerConfig::from_toml_str("page_size = 25\nfetch_size = 100\n").unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.fetch_size, 100);
        assert_eq!(config.initial_page, 1);
        assert!(config.prefetch);
        assert_eq!(config.pages_per_block(), 4);
    }

    #[test]
    fn test_from_toml_validates() {
        let err = PagerConfig::from_toml_str("page_size = 10\nfetch_size = 15\n").unwrap_err();
        assert!(matches!(err, ConfigError::FetchNotMultiple { .. }));
    }

    #[test]
    fn test_from_toml_reports_parse_errors() {
        let err = PagerConfig::from_toml_str("page_size = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }
}
