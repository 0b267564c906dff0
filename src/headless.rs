use std::io::Write;

use tokio::sync::mpsc;
use tracing::debug;

use crate::histogram::DayHistogram;
use crate::log::{LogFetcher, LogRecord, LogSource};

/// What a headless run delivered
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub records: u64,
    pub histogram: DayHistogram,
}

/// Stream `source` with `fetcher` and write every record to `out` as one
/// JSON object per line.
///
/// Parser batches go straight to the writer, without the worker's second
/// batching stage. A stream failure is returned as an error after the
/// records parsed before it have been written. A failed write stops the
/// fetch.
pub async fn export_records<W: Write>(
    fetcher: LogFetcher,
    source: LogSource,
    out: &mut W,
) -> anyhow::Result<ExportSummary> {
    let (batch_tx, mut batch_rx) = mpsc::unbounded_channel::<Vec<LogRecord>>();
    let fetch = tokio::spawn(async move {
        fetcher
            .fetch(&source, |batch| {
                let _ = batch_tx.send(batch);
            })
            .await
    });

    let mut summary = ExportSummary::default();
    while let Some(records) = batch_rx.recv().await {
        if let Err(err) = write_batch(out, &records) {
            fetch.abort();
            return Err(err);
        }
        summary.records += records.len() as u64;
        summary.histogram.ingest(&records);
    }
    out.flush()?;

    match fetch.await {
        Ok(Ok(stats)) => {
            debug!(records = summary.records, bytes = stats.bytes, "export finished");
            Ok(summary)
        }
        Ok(Err(err)) => {
            anyhow::bail!("stream failed after {} records: {}", summary.records, err)
        }
        Err(err) => anyhow::bail!("log stream task failed: {}", err),
    }
}

fn write_batch<W: Write>(out: &mut W, records: &[LogRecord]) -> anyhow::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Human-readable totals, one line per day
pub fn format_summary(summary: &ExportSummary) -> String {
    let mut text = format!("{} records", summary.records);
    for (day, count) in summary.histogram.buckets() {
        text.push_str(&format!("\n  {day}  {count}"));
    }
    text
}
