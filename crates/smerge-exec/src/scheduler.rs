//! Threaded upstreams.
//!
//! `spawn_upstream` moves a `RowSource` onto its own producer thread and
//! hands back a `ChannelSource` the merge driver can pull from. The queue
//! between them is bounded: a producer that runs ahead blocks until the
//! driver catches up, and a slow producer makes `pull` block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use smerge_core::prelude::{Row, Schema};
use smerge_operators::{CancelToken, OpError, RowSource};

/// How often a blocked `pull` re-checks the cancel signal.
const CANCEL_POLL: Duration = Duration::from_millis(20);

type Item = Result<Option<Row>, OpError>;

pub struct ChannelSource {
    name: String,
    schema: Schema,
    rx: Option<Receiver<Item>>,
    stop: Arc<AtomicBool>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
    done: bool,
}

/// Run `source` on a producer thread with a queue of `capacity` rows.
pub fn spawn_upstream(
    name: impl Into<String>,
    mut source: Box<dyn RowSource>,
    capacity: usize,
    cancel: CancelToken,
) -> std::io::Result<ChannelSource> {
    let name = name.into();
    let schema = source.schema().clone();
    let (tx, rx) = mpsc::sync_channel::<Item>(capacity.max(1));
    let stop = Arc::new(AtomicBool::new(false));

    let producer_stop = Arc::clone(&stop);
    let producer_name = name.clone();
    let handle = std::thread::Builder::new()
        .name(format!("smerge-upstream-{producer_name}"))
        .spawn(move || {
            produce(&mut *source, &tx, &producer_stop);
            source.close();
            tracing::trace!(upstream = %producer_name, "producer exited");
        })?;

    Ok(ChannelSource {
        name,
        schema,
        rx: Some(rx),
        stop,
        cancel,
        handle: Some(handle),
        done: false,
    })
}

fn produce(source: &mut dyn RowSource, tx: &SyncSender<Item>, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        let item = source.pull();
        let last = !matches!(item, Ok(Some(_)));
        // A send error means the consumer hung up.
        if tx.send(item).is_err() || last {
            return;
        }
    }
}

impl ChannelSource {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        // Dropping the receiver unblocks a producer waiting on a full queue.
        self.rx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(upstream = %self.name, "producer thread panicked");
            }
        }
    }
}

impl RowSource for ChannelSource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn pull(&mut self) -> Result<Option<Row>, OpError> {
        if self.done {
            return Ok(None);
        }
        let Some(rx) = self.rx.as_ref() else {
            return Ok(None);
        };
        loop {
            if self.cancel.is_canceled() {
                return Err(OpError::Canceled);
            }
            match rx.recv_timeout(CANCEL_POLL) {
                Ok(Ok(None)) => {
                    self.done = true;
                    return Ok(None);
                }
                Ok(item) => return item,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(OpError::Exec(format!(
                        "producer for {} stopped before end of stream",
                        self.name
                    )));
                }
            }
        }
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl Drop for ChannelSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smerge_core::prelude::{DataType, Field, Scalar};
    use smerge_operators::memory::MemorySource;

    fn schema() -> Schema {
        Schema::new(vec![Field::new("k", DataType::Int64, false)])
    }

    fn rows(n: i64) -> Vec<Row> {
        (0..n).map(|i| Row::new(vec![Scalar::I64(i)])).collect()
    }

    #[test]
    fn rows_arrive_in_order_through_a_small_queue() {
        let src = MemorySource::new(schema(), rows(100));
        let mut ch = spawn_upstream("a", Box::new(src), 2, CancelToken::new()).unwrap();
        let mut got = Vec::new();
        while let Some(row) = ch.pull().unwrap() {
            got.push(row);
        }
        assert_eq!(got, rows(100));
        assert_eq!(ch.pull().unwrap(), None);
    }

    #[test]
    fn producer_errors_are_forwarded() {
        let src = MemorySource::failing(schema(), rows(1), "bad block");
        let mut ch = spawn_upstream("a", Box::new(src), 4, CancelToken::new()).unwrap();
        assert!(ch.pull().unwrap().is_some());
        let err = ch.pull().unwrap_err();
        assert!(err.to_string().contains("bad block"));
    }

    #[test]
    fn cancel_interrupts_pull() {
        let cancel = CancelToken::new();
        let src = MemorySource::new(schema(), rows(10));
        let mut ch = spawn_upstream("a", Box::new(src), 1, cancel.clone()).unwrap();
        cancel.cancel();
        assert!(ch.pull().unwrap_err().is_canceled());
    }

    #[test]
    fn close_releases_a_blocked_producer() {
        let src = MemorySource::new(schema(), rows(1000));
        let closed = src.closed_flag();
        let mut ch = spawn_upstream("a", Box::new(src), 1, CancelToken::new()).unwrap();
        assert!(ch.pull().unwrap().is_some());
        ch.close();
        assert!(closed.load(Ordering::Acquire));
    }
}
