//! Asset href signing.
//!
//! Some catalogs (Planetary Computer) serve asset hrefs that must be
//! exchanged for a short-lived authorized URL before they can be read.

mod none;

pub use none::NoSigning;

use crate::error::Result;

/// Exchanges an asset href for a directly fetchable URL.
///
/// Implementations return the href unchanged when no authorization is
/// needed, or [`CloudError::Auth`](crate::CloudError::Auth) when the
/// exchange is refused.
pub trait AssetSigner: Send + Sync {
    fn sign(&self, href: &str) -> Result<String>;
}

impl<F> AssetSigner for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn sign(&self, href: &str) -> Result<String> {
        self(href)
    }
}
