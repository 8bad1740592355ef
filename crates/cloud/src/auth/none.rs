//! No-op signing for public endpoints.

use crate::auth::AssetSigner;
use crate::error::Result;

/// No signing: hrefs are already fetchable as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSigning;

impl AssetSigner for NoSigning {
    fn sign(&self, href: &str) -> Result<String> {
        Ok(href.to_string())
    }
}
