//! PDF validation and text extraction.
//!
//! Extraction is a pure function over the input bytes: validate the
//! container signature first, then pull concatenated plain text from
//! all pages in document order. The URL variant checks transport
//! status before any parsing so a bad download is reported as
//! `FetchFailed`, not `InvalidFormat`.

use crate::error::ExtractError;

/// The four-byte PDF file signature.
pub const PDF_SIGNATURE: &[u8; 4] = b"%PDF";

/// Check whether `bytes` starts with the PDF signature.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.len() >= PDF_SIGNATURE.len() && &bytes[..PDF_SIGNATURE.len()] == PDF_SIGNATURE
}

/// Extract plain text from PDF bytes.
///
/// Rejects anything that does not carry the PDF signature before the
/// parser sees it. Zero extracted text is a distinct failure
/// ([`ExtractError::EmptyContent`]): it usually means a scanned,
/// image-only document rather than a successful empty extraction.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if !is_pdf(bytes) {
        return Err(ExtractError::InvalidFormat);
    }

    // pdf-extract can panic on malformed font tables, so contain it.
    let parsed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    let text = match parsed {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(ExtractError::Parse(e.to_string())),
        Err(_) => return Err(ExtractError::Parse("parser panicked".to_string())),
    };

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyContent);
    }

    Ok(text)
}

/// Fetch a PDF from `url` and extract its text.
///
/// Transport failures and non-success statuses surface as
/// [`ExtractError::FetchFailed`]; only a successfully downloaded body
/// is handed to the parser.
pub async fn extract_pdf_from_url(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, ExtractError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ExtractError::FetchFailed {
            status: e.status().map(|s| s.as_u16()),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::FetchFailed {
            status: Some(status.as_u16()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|_| ExtractError::FetchFailed { status: None })?;

    extract_pdf_text(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf_signature() {
        let err = extract_pdf_text(b"PK\x03\x04 definitely a zip").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidFormat));
    }

    #[test]
    fn rejects_short_buffers() {
        let err = extract_pdf_text(b"%P").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidFormat));
    }

    #[test]
    fn signature_check_is_exact() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(!is_pdf(b"PDF%-1.7"));
        assert!(!is_pdf(b""));
    }

    #[tokio::test]
    async fn missing_remote_file_is_a_fetch_failure_with_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n")
                .await;
        });

        let client = reqwest::Client::new();
        let err = extract_pdf_from_url(&client, &format!("http://{addr}/missing.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FetchFailed { status: Some(404) }));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_failure_without_status() {
        // Bind then drop to get a port nothing is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = reqwest::Client::new();
        let err = extract_pdf_from_url(&client, &format!("http://{addr}/doc.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FetchFailed { status: None }));
    }

    #[test]
    fn truncated_pdf_is_a_parse_error_not_a_panic() {
        // Valid signature, garbage body: must come back as Parse or
        // EmptyContent, never unwind.
        let err = extract_pdf_text(b"%PDF-1.4 garbage body with no xref").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Parse(_) | ExtractError::EmptyContent
        ));
    }
}
