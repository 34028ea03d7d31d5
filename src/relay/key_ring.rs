use crate::config::{Credentials, UpstreamConfig};
use crate::relay::upstream::{GeminiClient, Generator};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTier {
    Free,
    Paid,
}

impl fmt::Display for KeyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyTier::Free => f.write_str("free"),
            KeyTier::Paid => f.write_str("paid"),
        }
    }
}

/// The mandatory free-tier generator and the optional paid-tier one.
///
/// Read-only after startup; shared by every request.
#[derive(Clone)]
pub struct KeyRing {
    free: Arc<dyn Generator>,
    paid: Option<Arc<dyn Generator>>,
}

impl KeyRing {
    pub fn new(free: Arc<dyn Generator>, paid: Option<Arc<dyn Generator>>) -> Self {
        Self { free, paid }
    }

    /// One Gemini client per configured key.
    pub fn from_credentials(
        credentials: &Credentials,
        upstream: &UpstreamConfig,
    ) -> Result<Self, reqwest::Error> {
        let free = GeminiClient::new(upstream, credentials.free.clone())?;
        let paid = match &credentials.paid {
            Some(key) => Some(Arc::new(GeminiClient::new(upstream, key.clone())?) as Arc<dyn Generator>),
            None => None,
        };

        Ok(Self::new(Arc::new(free), paid))
    }

    pub fn has_paid(&self) -> bool {
        self.paid.is_some()
    }

    /// The paid generator when it was asked for and exists, the free one otherwise.
    pub fn select(&self, paid_key_use: bool) -> (KeyTier, &Arc<dyn Generator>) {
        match (&self.paid, paid_key_use) {
            (Some(paid), true) => (KeyTier::Paid, paid),
            _ => (KeyTier::Free, &self.free),
        }
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("has_paid", &self.has_paid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::upstream::RemoteError;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Generator for Named {
        async fn generate(&self, _model: &str, _message: &str) -> Result<Option<String>, RemoteError> {
            Ok(Some(self.0.to_string()))
        }
    }

    fn ring(with_paid: bool) -> KeyRing {
        let paid: Option<Arc<dyn Generator>> = if with_paid {
            Some(Arc::new(Named("paid")))
        } else {
            None
        };
        KeyRing::new(Arc::new(Named("free")), paid)
    }

    #[tokio::test]
    async fn test_select_paid_when_requested_and_present() {
        let ring = ring(true);
        let (tier, generator) = ring.select(true);
        assert_eq!(tier, KeyTier::Paid);
        assert_eq!(generator.generate("m", "x").await.unwrap().as_deref(), Some("paid"));
    }

    #[tokio::test]
    async fn test_select_free_when_not_requested() {
        let ring = ring(true);
        let (tier, generator) = ring.select(false);
        assert_eq!(tier, KeyTier::Free);
        assert_eq!(generator.generate("m", "x").await.unwrap().as_deref(), Some("free"));
    }

    #[tokio::test]
    async fn test_paid_request_falls_back_to_free() {
        let ring = ring(false);
        assert!(!ring.has_paid());

        let (tier, generator) = ring.select(true);
        assert_eq!(tier, KeyTier::Free);
        assert_eq!(generator.generate("m", "x").await.unwrap().as_deref(), Some("free"));
    }

    #[test]
    fn test_from_credentials() {
        let upstream = UpstreamConfig::default();

        let free_only = KeyRing::from_credentials(&Credentials::new("free", None), &upstream).unwrap();
        assert!(!free_only.has_paid());

        let both = KeyRing::from_credentials(
            &Credentials::new("free", Some("paid".to_string())),
            &upstream,
        )
        .unwrap();
        assert!(both.has_paid());
        assert_eq!(format!("{:?}", both), "KeyRing { has_paid: true }");
    }
}
