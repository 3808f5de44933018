use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::json;

use financekit_core::events::{EmitError, RelayEvent, RelayEventSink};
use financekit_core::store::SharedStateStore;
use financekit_core::utils::from_millis;
use financekit_relay::{PendingChangeDrain, UiDispatcher};

pub fn list(store: &SharedStateStore, out: &mut impl Write) -> anyhow::Result<()> {
    for file in store.list_pending() {
        let captured_at = from_millis(file.stamp).map(|t| t.to_rfc3339());
        let line = match store.read_pending(&file) {
            Ok(batch) => json!({
                "file": file.file_name(),
                "accountId": file.account_id,
                "stamp": file.stamp,
                "capturedAt": captured_at,
                "changes": batch.change_count(),
                "hasHistoryToken": batch.has_history_token,
            }),
            Err(e) => json!({
                "file": file.file_name(),
                "accountId": file.account_id,
                "stamp": file.stamp,
                "capturedAt": captured_at,
                "error": e.to_string(),
            }),
        };
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

pub fn markers(store: &SharedStateStore, out: &mut impl Write) -> anyhow::Result<()> {
    let info = store.last_sync_info();
    writeln!(out, "{}", serde_json::to_string(&info)?)?;
    Ok(())
}

/// Writes each drained event as `{"event", "payload"}` JSON.
struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> RelayEventSink for JsonLinesSink<W> {
    fn emit(&self, event: RelayEvent) -> Result<(), EmitError> {
        let payload = event
            .payload()
            .map_err(|e| EmitError::Serialization(e.to_string()))?;
        let line = json!({ "event": event.name(), "payload": payload });
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(out, "{}", line).map_err(|e| EmitError::Rejected(e.to_string()))
    }
}

pub async fn drain(store: Arc<SharedStateStore>) -> anyhow::Result<()> {
    let sink = Arc::new(JsonLinesSink {
        out: Mutex::new(std::io::stdout()),
    });
    let (dispatcher, _worker) = UiDispatcher::spawn(sink);
    let report = PendingChangeDrain::new(store, dispatcher).drain().await;

    tracing::info!(
        emitted = report.emitted,
        corrupt = report.corrupt.len(),
        failed = report.failed.len(),
        "Drain finished"
    );
    if !report.is_clean() {
        anyhow::bail!(
            "{} file(s) left in place: {:?}",
            report.corrupt.len() + report.failed.len(),
            report.corrupt.iter().chain(&report.failed).collect::<Vec<_>>()
        );
    }
    Ok(())
}
