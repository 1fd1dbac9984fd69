//! One end-to-end run: fetch and buffer the reading, then bundle, encrypt
//! and attach once the buffer is ready.
//!
//! The buffer is only cleared after a fully successful submission. A
//! failed encryption or node call leaves every record in place, so the
//! next scheduled run retries the whole accumulated batch
//! (at-least-once delivery; duplicates are possible on partial failures).

use anyhow::Result;
use tracing::{info, warn};

use tanglefeed_buffer::Buffer;
use tanglefeed_ledger::LedgerClient;
use tanglefeed_mam::{MamCliEncrypter, MessageEncrypter};
use tanglefeed_sensor::{PublicDataQuery, SensorClient};

use crate::config::Settings;

/// What one run of the pipeline did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The reading was buffered; the threshold was not reached and
    /// nothing was sent.
    Buffered { pending: usize, capacity: usize },
    /// The accumulated batch was encrypted and attached, and the buffer
    /// was cleared.
    Submitted {
        readings: usize,
        transactions: usize,
    },
}

/// Runs the pipeline with the subprocess-backed encrypter.
pub async fn run(settings: &Settings) -> Result<RunOutcome> {
    let encrypter = MamCliEncrypter::new(settings.mam.clone())?;
    run_with_encrypter(settings, &encrypter).await
}

/// Runs the pipeline with any [`MessageEncrypter`] implementation.
pub async fn run_with_encrypter(
    settings: &Settings,
    encrypter: &dyn MessageEncrypter,
) -> Result<RunOutcome> {
    let buffer = Buffer::open(&settings.buffer_directory, settings.buffer_size)?;
    // Held for the whole run: a concurrently scheduled invocation must
    // not drain or clear the directory underneath us.
    let _lock = buffer.lock()?;

    let mut sensor = SensorClient::new(settings.sensor.clone())?;
    let reading = sensor.get_public_data(&PublicDataQuery::default()).await?;
    buffer.add(serde_json::to_string(&reading)?.as_bytes())?;

    if !buffer.is_ready()? {
        let pending = buffer.len()?;
        info!(
            pending,
            capacity = settings.buffer_size,
            "reading buffered; waiting for more before attaching"
        );
        return Ok(RunOutcome::Buffered {
            pending,
            capacity: settings.buffer_size,
        });
    }

    let readings = buffer.read()?;
    let bundle = serde_json::json!({
        "price": settings.price,
        "data": readings,
    });
    let message = serde_json::to_string(&bundle)?;

    let units = match encrypter.encrypt(&settings.seed, &message).await {
        Ok(units) => units,
        Err(e) => {
            warn!(error = %e, "encryption failed; keeping buffered readings for retry");
            return Err(e.into());
        }
    };

    let ledger = LedgerClient::new(settings.ledger.clone())?;
    let attached = match ledger.send_trytes(&units).await {
        Ok(attached) => attached,
        Err(e) => {
            warn!(error = %e, "submission failed; keeping buffered readings for retry");
            return Err(e.into());
        }
    };

    buffer.clear()?;
    info!(
        readings = readings.len(),
        transactions = attached.len(),
        "batch attached and buffer cleared"
    );
    Ok(RunOutcome::Submitted {
        readings: readings.len(),
        transactions: attached.len(),
    })
}
