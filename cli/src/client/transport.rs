//! Transport error classification.
//!
//! The HTTP stack does not expose a uniform typed "connection refused" value
//! across platforms and resolvers, so connection failures are recognised by
//! matching known phrases against every message in the error's source chain.
//! The allow-list lives in [`CONNECTION_ERROR_PATTERNS`].

use std::error::Error;

use crate::error::CliError;

/// Lowercase phrases that identify a connection-level failure.
///
/// A bare `eof` is matched separately as a whole word (`mentions_eof`).
pub const CONNECTION_ERROR_PATTERNS: &[&str] = &[
    "connection refused",
    "no such host",
    "dial tcp",
    "unexpected eof",
    "connection reset",
    "broken pipe",
    "network is unreachable",
    "dns error",
    "failed to lookup address",
];

/// Returns `true` if any error in the chain is a connection-level failure.
pub fn is_connection_error(err: &(dyn Error + 'static)) -> bool {
    chain(err).any(|e| {
        if e.downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_connect)
        {
            return true;
        }
        let message = e.to_string().to_lowercase();
        CONNECTION_ERROR_PATTERNS
            .iter()
            .any(|pattern| message.contains(pattern))
            || mentions_eof(&message)
    })
}

/// `eof` as a standalone word, so `thereof` or `geofence` do not count.
fn mentions_eof(message: &str) -> bool {
    message
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case("eof"))
}

/// Returns `true` if any error in the chain is a timeout.
pub fn is_timeout(err: &(dyn Error + 'static)) -> bool {
    chain(err).any(|e| {
        e.downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_timeout)
            || e.downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::TimedOut)
    })
}

/// Maps a transport error onto the CLI error taxonomy.
///
/// Connection failures win over timeouts, so a connect timeout is reported
/// as [`CliError::ConnectionFailed`].
pub fn classify(err: &(dyn Error + 'static)) -> CliError {
    if is_connection_error(err) {
        CliError::ConnectionFailed(describe(err))
    } else if is_timeout(err) {
        CliError::Timeout
    } else {
        CliError::Network(describe(err))
    }
}

/// Joins the chain into one line, e.g. `error sending request: connection refused`.
fn describe(err: &(dyn Error + 'static)) -> String {
    chain(err)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

fn chain<'a>(err: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::io;

    use super::*;

    #[derive(Debug)]
    struct Wrapped {
        context: &'static str,
        source: io::Error,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.context)
        }
    }

    impl Error for Wrapped {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.source)
        }
    }

    fn wrapped(kind: io::ErrorKind, message: &str) -> Wrapped {
        Wrapped {
            context: "error sending request",
            source: io::Error::new(kind, message.to_string()),
        }
    }

    #[test]
    fn recognises_every_allow_listed_phrase() {
        for pattern in CONNECTION_ERROR_PATTERNS {
            let err = io::Error::other(format!("tcp connect: {}", pattern.to_uppercase()));
            assert!(is_connection_error(&err), "pattern not matched: {pattern}");
        }
    }

    #[test]
    fn eof_only_matches_as_a_whole_word() {
        assert!(is_connection_error(&io::Error::other("connection closed: EOF")));
        assert!(is_connection_error(&io::Error::other("tls handshake eof")));
        assert!(!is_connection_error(&io::Error::other("invalid geofence region")));
        assert!(!is_connection_error(&io::Error::other("the length thereof")));
    }

    #[test]
    fn matches_phrases_deep_in_the_source_chain() {
        let err = wrapped(io::ErrorKind::ConnectionRefused, "Connection refused (os error 111)");
        assert!(is_connection_error(&err));
        assert!(matches!(classify(&err), CliError::ConnectionFailed(msg) if msg.contains("os error 111")));
    }

    #[test]
    fn timeouts_are_not_connection_failures() {
        let err = wrapped(io::ErrorKind::TimedOut, "operation timed out");
        assert!(!is_connection_error(&err));
        assert!(matches!(classify(&err), CliError::Timeout));
    }

    #[test]
    fn unknown_errors_become_network_errors() {
        let err = wrapped(io::ErrorKind::InvalidData, "invalid HTTP header");
        assert!(matches!(classify(&err), CliError::Network(msg) if msg.contains("invalid HTTP header")));
    }

    #[tokio::test]
    async fn refused_connection_is_classified_as_connection_failure() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();

        assert!(is_connection_error(&err));
        assert!(matches!(CliError::from(err), CliError::ConnectionFailed(_)));
    }
}
