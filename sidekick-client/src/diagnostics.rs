//! Failure reporting sink.
//!
//! The exchange functions report every failure here at the point it is
//! detected, with whatever detail is available (peer message, parser
//! position, byte counts), before returning the error.

/// Receives human-readable failure descriptions.
pub trait Diagnostics {
    fn report(&self, message: &str);
}

/// Forwards failure reports to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, message: &str) {
        tracing::error!(target: "sidekick::agent", "{}", message);
    }
}

/// Collects reports in memory. Used by tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CollectingDiagnostics {
    messages: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl CollectingDiagnostics {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Diagnostics for CollectingDiagnostics {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
