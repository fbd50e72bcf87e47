//! Recognition engine boundary.
//!
//! The engine that turns a prepared image into text is an external
//! collaborator. `RecognitionClient` is the seam: the pipeline works the
//! same whether the backend is the local `ocrs` stack or a remote service.
//! Engine failures are never fatal — the session treats them as "no
//! detection this cycle".

pub mod http_client;
pub mod ocrs_client;

pub use http_client::{HttpClient, HttpClientConfig};
pub use ocrs_client::OcrsClient;

use crate::error::RecognitionError;
use crate::models::{PreparedImage, RecognitionResult};

/// Symbols the engine is allowed to emit. Restricting the alphabet to
/// uppercase letters, digits, and the plate separator cuts down false
/// positives from scene text.
#[derive(Debug, Clone)]
pub struct Charset {
    separator: char,
}

impl Charset {
    pub fn plate(separator: char) -> Self {
        Self { separator }
    }

    pub fn permits(&self, ch: char) -> bool {
        ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == self.separator
    }

    /// Strip symbols outside the charset. Whitespace survives so the
    /// validator can still normalize line breaks.
    pub fn filter(&self, text: &str) -> String {
        text.chars()
            .filter(|ch| self.permits(*ch) || ch.is_whitespace())
            .collect()
    }

    pub fn separator(&self) -> char {
        self.separator
    }
}

/// How the engine should segment the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionMode {
    /// Treat the image as one line of text (a plate), not a paragraph.
    SingleLine,
}

/// A pluggable recognition backend.
pub trait RecognitionClient {
    fn recognize(
        &self,
        image: &PreparedImage,
        charset: &Charset,
        mode: RecognitionMode,
    ) -> impl Future<Output = Result<RecognitionResult, RecognitionError>> + Send;
}

impl<T> RecognitionClient for std::sync::Arc<T>
where
    T: RecognitionClient + Send + Sync,
{
    fn recognize(
        &self,
        image: &PreparedImage,
        charset: &Charset,
        mode: RecognitionMode,
    ) -> impl Future<Output = Result<RecognitionResult, RecognitionError>> + Send {
        (**self).recognize(image, charset, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_strips_unknown_symbols_but_keeps_whitespace() {
        let charset = Charset::plate('-');
        assert_eq!(charset.filter("AB C*-12_34\n!"), "AB C-1234\n");
    }

    #[test]
    fn charset_rejects_lowercase() {
        let charset = Charset::plate('-');
        assert!(!charset.permits('a'));
        assert!(charset.permits('A'));
        assert!(charset.permits('7'));
        assert!(charset.permits('-'));
    }
}
