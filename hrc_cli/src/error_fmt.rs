//! Human-readable error descriptions and structured JSON error formatting.

use hrc_core::{Action, CallError, SessionError};

fn service_down_hint(detail: &str) -> String {
    format!(
        "What happened: The heart-rate service could not be reached ({detail}).\nLikely causes: The service is not running, api.base_url points at the wrong host, or the network is down.\nHow to fix: Start the service, check api.base_url (or HRC_BASE_URL), or rerun with --simulate."
    )
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(se) = err.downcast_ref::<SessionError>() {
        return match se {
            SessionError::StepFailed { action: Action::Connect, message } => {
                if message.starts_with("transport error") {
                    service_down_hint(message)
                } else {
                    format!(
                        "What happened: The monitor could not be connected ({message}).\nLikely causes: The chest strap is off, out of range, or paired elsewhere.\nHow to fix: Wet the strap contacts, keep it near the kiosk, and try again."
                    )
                }
            }
            SessionError::StepFailed { action, message } if message.starts_with("transport error") => {
                format!("{action} failed.\n{}", service_down_hint(message))
            }
            SessionError::StepFailed { action: Action::GetBaseline, message } => format!(
                "What happened: No baseline could be recorded ({message}).\nLikely causes: The strap produced no readings during the baseline window.\nHow to fix: Check strap contact and rerun; raise simulator.baseline_ms when simulating."
            ),
            SessionError::StepFailed { action, message } => format!(
                "What happened: {action} failed ({message}).\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
            SessionError::StepTimeout { action } => format!(
                "What happened: Timed out waiting for {action} to complete.\nLikely causes: The service is slow or hung, or session.step_timeout_ms is shorter than the baseline window.\nHow to fix: Raise session.step_timeout_ms or check the service."
            ),
            SessionError::Rejected { .. } | SessionError::Pending { .. } => format!(
                "What happened: {se}.\nLikely causes: Actions were issued out of order.\nHow to fix: connect, then baseline, then challenge, then finish."
            ),
            SessionError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(CallError::Transport(msg)) = err.downcast_ref::<CallError>() {
        return service_down_hint(msg);
    }

    // String-based heuristics for errors coming from init or config
    let msg = err
        .chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid configuration") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range values in the TOML or a bad HRC_* environment override.\nHow to fix: Edit the TOML config (see `hrc self-check`) and try again."
        );
    }

    if lower.contains("http feature") {
        return format!("What happened: {msg}.\nHow to fix: Rebuild with default features or pass --simulate.");
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per failure kind; anything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<SessionError>() {
        Some(SessionError::StepFailed { .. }) => 3,
        Some(SessionError::StepTimeout { .. }) => 4,
        Some(SessionError::Rejected { .. } | SessionError::Pending { .. }) => 5,
        Some(SessionError::Config(_)) => 2,
        None if err.downcast_ref::<CallError>().is_some() => 3,
        None => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<SessionError>() {
        Some(SessionError::StepFailed { .. }) => "StepFailed",
        Some(SessionError::StepTimeout { .. }) => "StepTimeout",
        Some(SessionError::Rejected { .. }) => "Rejected",
        Some(SessionError::Pending { .. }) => "Pending",
        Some(SessionError::Config(_)) => "Config",
        None if err.downcast_ref::<CallError>().is_some() => "Unreachable",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let step = match err.downcast_ref::<SessionError>() {
        Some(
            SessionError::StepFailed { action, .. }
            | SessionError::StepTimeout { action }
            | SessionError::Rejected { action, .. }
            | SessionError::Pending { action },
        ) => Some(action.to_string()),
        _ => None,
    };
    let mut obj = json!({ "reason": reason_name(err), "message": humanize(err) });
    if let Some(step) = step {
        obj["step"] = json!(step);
    }
    obj.to_string()
}
