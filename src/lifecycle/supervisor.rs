//! Top-level supervision of the server task.
//!
//! The server runs on its own task. If it returns an error or panics, the
//! failure is logged and the process exits non-zero after a short grace
//! delay so an external supervisor can restart it. No in-process recovery
//! is attempted.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;

/// Run `task` to completion and translate its outcome into an exit code.
pub async fn supervise<F, E>(task: F, grace: Duration) -> ExitCode
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let reason = match tokio::spawn(task).await {
        Ok(Ok(())) => return ExitCode::SUCCESS,
        Ok(Err(e)) => e.to_string(),
        Err(join_error) if join_error.is_panic() => {
            format!("server task panicked: {}", panic_message(join_error.into_panic()))
        }
        Err(join_error) => format!("server task aborted: {}", join_error),
    };
    fatal(&reason, grace).await
}

/// Log `reason`, wait out `grace`, and return a failing exit code.
pub async fn fatal(reason: &str, grace: Duration) -> ExitCode {
    tracing::error!(
        reason = %reason,
        grace_ms = grace.as_millis() as u64,
        "Fatal error, exiting after grace period"
    );
    tokio::time::sleep(grace).await;
    ExitCode::FAILURE
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
