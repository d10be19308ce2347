//! Maps `Box<dyn Error>` from trait boundaries to typed `CallError`.
//!
//! The traits in `hrc_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `hrc_client::ClientError` downcasting.

use crate::error::CallError;

/// Map a trait-boundary error to a typed `CallError`.
///
/// Every boundary failure is a transport failure; remote failures arrive as
/// well-formed replies and never take this path.
pub fn map_client_error(e: &(dyn std::error::Error + 'static)) -> CallError {
    // Feature-gated: try to downcast to ClientError for a precise message
    #[cfg(feature = "client-errors")]
    {
        if let Some(ce) = e.downcast_ref::<hrc_client::ClientError>() {
            return match ce {
                hrc_client::ClientError::Transport(msg) => CallError::Transport(msg.clone()),
                hrc_client::ClientError::Status { code, .. } => {
                    CallError::Transport(format!("service answered HTTP {code}"))
                }
                other => CallError::Transport(other.to_string()),
            };
        }
    }

    CallError::Transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_become_transport() {
        let e = std::io::Error::other("connection refused");
        assert_eq!(
            map_client_error(&e),
            CallError::Transport("connection refused".into())
        );
    }

    #[cfg(feature = "client-errors")]
    #[test]
    fn status_errors_hide_the_body() {
        let e = hrc_client::ClientError::Status {
            code: 502,
            body: "<html>bad gateway</html>".into(),
        };
        assert_eq!(
            map_client_error(&e),
            CallError::Transport("service answered HTTP 502".into())
        );
    }
}
