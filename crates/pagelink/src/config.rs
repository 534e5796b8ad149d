//! Configuration for paging endpoints.

use pagelink_core::{ServiceAddress, DEFAULT_PAGE_SIZE};

use crate::error::{PagingError, Result};

/// Largest payload accepted by default: 2 GiB less one byte.
pub const DEFAULT_MAX_PAYLOAD_LEN: u64 = i32::MAX as u64;

/// Configuration shared by the serving and calling sides.
#[derive(Debug, Clone)]
pub struct PagingConfig {
    /// Bytes per page produced by this side when it sends.
    pub page_size: usize,
    /// Address of this endpoint, stamped into prepared pull sessions so
    /// consumers know where to fetch from.
    pub origin_address: Option<ServiceAddress>,
    /// Upper bound on announced payload lengths. Receive buffers are sized
    /// from the announcement, so anything larger is refused before allocation.
    pub max_payload_len: u64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            origin_address: None,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

impl PagingConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_origin_address(mut self, address: impl Into<ServiceAddress>) -> Self {
        self.origin_address = Some(address.into());
        self
    }

    pub fn with_max_payload_len(mut self, max_payload_len: u64) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    /// Buffer length for an announced payload, or `PayloadTooLarge`.
    pub fn checked_payload_len(&self, origin_len: u64) -> Result<usize> {
        if origin_len > self.max_payload_len {
            return Err(PagingError::PayloadTooLarge(origin_len));
        }
        usize::try_from(origin_len).map_err(|_| PagingError::PayloadTooLarge(origin_len))
    }

    /// Reject settings no transfer could run with.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(PagingError::InvalidConfig(
                "page_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PagingConfig::default();
        assert_eq!(config.page_size, 65_000);
        assert!(config.origin_address.is_none());
        assert_eq!(config.max_payload_len, 2_147_483_647);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = PagingConfig::default().with_page_size(0);
        assert!(matches!(config.validate(), Err(PagingError::InvalidConfig(_))));
    }

    #[test]
    fn test_payload_len_bound() {
        let config = PagingConfig::default().with_max_payload_len(1_000);
        assert_eq!(config.checked_payload_len(0).unwrap(), 0);
        assert_eq!(config.checked_payload_len(1_000).unwrap(), 1_000);
        assert!(matches!(
            config.checked_payload_len(1_001),
            Err(PagingError::PayloadTooLarge(1_001))
        ));
        assert!(matches!(
            PagingConfig::default().checked_payload_len(u64::MAX),
            Err(PagingError::PayloadTooLarge(u64::MAX))
        ));
    }

    #[test]
    fn test_builder() {
        let config = PagingConfig::default()
            .with_page_size(100_000)
            .with_origin_address("fabric:/orders/ledger");
        assert_eq!(config.page_size, 100_000);
        assert_eq!(
            config.origin_address.as_ref().map(|a| a.as_str()),
            Some("fabric:/orders/ledger")
        );
    }
}
