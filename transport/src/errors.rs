//! Mapping reqwest failures to errno-style codes

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use http_flood_core::TransportError;

/// Classify a reqwest error
///
/// Timeouts keep their own variant. Everything else becomes a connection
/// failure whose code is derived from the innermost `io::Error` in the source
/// chain, falling back to hints in the error text.
pub(crate) fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(timeout);
    }
    if err.is_builder() {
        return TransportError::InvalidRequest(err.to_string());
    }

    let chain = error_chain(err);
    let message = chain.join(": ");

    if let Some(code) = code_from_io(err) {
        return TransportError::connection(code, message);
    }

    TransportError::connection(code_from_text(&message, err.is_connect()), message)
}

fn error_chain(err: &reqwest::Error) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        chain.push(inner.to_string());
        source = inner.source();
    }
    chain
}

fn code_from_io(err: &reqwest::Error) -> Option<&'static str> {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            if let Some(code) = io_error_code(io_err.kind()) {
                return Some(code);
            }
        }
        source = inner.source();
    }
    None
}

/// errno name for the io error kinds a flood run typically hits
pub(crate) fn io_error_code(kind: io::ErrorKind) -> Option<&'static str> {
    let code = match kind {
        io::ErrorKind::ConnectionRefused => "ECONNREFUSED",
        io::ErrorKind::ConnectionReset => "ECONNRESET",
        io::ErrorKind::ConnectionAborted => "ECONNABORTED",
        io::ErrorKind::TimedOut => "ETIMEDOUT",
        io::ErrorKind::AddrNotAvailable => "EADDRNOTAVAIL",
        io::ErrorKind::AddrInUse => "EADDRINUSE",
        io::ErrorKind::BrokenPipe => "EPIPE",
        io::ErrorKind::UnexpectedEof => "ECONNRESET",
        io::ErrorKind::NotConnected => "ENOTCONN",
        io::ErrorKind::PermissionDenied => "EACCES",
        _ => return None,
    };
    Some(code)
}

pub(crate) fn code_from_text(message: &str, is_connect: bool) -> &'static str {
    let lower = message.to_ascii_lowercase();
    if lower.contains("dns error") || lower.contains("failed to lookup address") {
        "ENOTFOUND"
    } else if lower.contains("connection closed before message completed")
        || lower.contains("connection reset")
    {
        "ECONNRESET"
    } else if lower.contains("connection refused") {
        "ECONNREFUSED"
    } else if is_connect {
        "ECONNERROR"
    } else {
        "EPROTO"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_codes() {
        assert_eq!(
            io_error_code(io::ErrorKind::ConnectionRefused),
            Some("ECONNREFUSED")
        );
        assert_eq!(io_error_code(io::ErrorKind::ConnectionReset), Some("ECONNRESET"));
        assert_eq!(io_error_code(io::ErrorKind::TimedOut), Some("ETIMEDOUT"));
        assert_eq!(io_error_code(io::ErrorKind::Other), None);
    }

    #[test]
    fn test_text_fallbacks() {
        assert_eq!(
            code_from_text("error sending request: dns error: failed to lookup address", true),
            "ENOTFOUND"
        );
        assert_eq!(
            code_from_text("connection closed before message completed", false),
            "ECONNRESET"
        );
        assert_eq!(code_from_text("something odd", true), "ECONNERROR");
        assert_eq!(code_from_text("invalid HTTP version parsed", false), "EPROTO");
    }
}
