//! Background delivery of host callbacks
//!
//! A dedicated thread drives a single-threaded tokio runtime that drains a
//! bounded queue, calling the host once per message in submission order.
//! Producers never block: a full queue is reported to the caller.

use std::sync::Arc;
use std::thread::JoinHandle;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::Host;
use crate::object::{AudioObjectId, PropertyAddress};
use crate::utils::error::{HardwareError, HardwareResult};

/// Messages that may be waiting for the host at once
pub const NOTIFIER_QUEUE_CAPACITY: usize = 64;

/// One deferred host callback
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    PropertiesChanged {
        object: AudioObjectId,
        addresses: Vec<PropertyAddress>,
    },
    RequestConfigurationChange {
        device: AudioObjectId,
        change_action: u64,
    },
    WriteStorage {
        key: String,
        value: Value,
    },
    DeleteStorage {
        key: String,
    },
}

impl HostMessage {
    fn deliver(&self, host: &dyn Host) -> HardwareResult<()> {
        match self {
            HostMessage::PropertiesChanged { object, addresses } => {
                host.properties_changed(*object, addresses)
            }
            HostMessage::RequestConfigurationChange {
                device,
                change_action,
            } => host.request_device_configuration_change(*device, *change_action),
            HostMessage::WriteStorage { key, value } => host.write_to_storage(key, value),
            HostMessage::DeleteStorage { key } => host.delete_from_storage(key),
        }
    }
}

/// Queue of host callbacks and the worker draining it
pub struct HostNotifier {
    tx: mpsc::Sender<HostMessage>,
    /// Stop signal sender
    stop_tx: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl HostNotifier {
    /// Spawn the worker thread
    pub fn start(host: Arc<dyn Host>, capacity: usize) -> HardwareResult<Self> {
        let (tx, mut rx) = mpsc::channel::<HostMessage>(capacity);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HardwareError::Unspecified(format!("notifier runtime: {e}")))?;

        let worker = std::thread::Builder::new()
            .name("loopdev-host".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    loop {
                        tokio::select! {
                            biased;

                            message = rx.recv() => {
                                let Some(message) = message else {
                                    break;
                                };
                                if let Err(e) = message.deliver(host.as_ref()) {
                                    tracing::warn!(error = %e, ?message, "Host callback failed");
                                }
                            }
                            _ = stop_rx.recv() => {
                                tracing::debug!("Host notifier stopped");
                                break;
                            }
                        }
                    }
                });
            })
            .map_err(|e| HardwareError::Unspecified(format!("notifier thread: {e}")))?;

        tracing::info!(capacity, "Host notifier started");
        Ok(Self {
            tx,
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        })
    }

    /// Queue a message without blocking
    pub fn post(&self, message: HostMessage) -> HardwareResult<()> {
        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(message) => {
                HardwareError::illegal(format!("host queue full, dropped {message:?}"))
            }
            TrySendError::Closed(_) => HardwareError::illegal("host notifier is stopped"),
        })
    }

    /// Signal the worker and wait for it to finish
    ///
    /// Messages queued before the call are delivered first.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Host notifier worker panicked");
            }
        }
    }
}

impl Drop for HostNotifier {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct LogHost {
        calls: Mutex<Vec<String>>,
    }

    impl Host for LogHost {
        fn properties_changed(
            &self,
            object: AudioObjectId,
            addresses: &[PropertyAddress],
        ) -> HardwareResult<()> {
            self.calls
                .lock()
                .push(format!("changed {object} x{}", addresses.len()));
            Ok(())
        }

        fn request_device_configuration_change(
            &self,
            device: AudioObjectId,
            change_action: u64,
        ) -> HardwareResult<()> {
            self.calls
                .lock()
                .push(format!("config {device} {change_action}"));
            Ok(())
        }

        fn copy_from_storage(&self, _key: &str) -> HardwareResult<Option<Value>> {
            Ok(None)
        }

        fn write_to_storage(&self, key: &str, _value: &Value) -> HardwareResult<()> {
            self.calls.lock().push(format!("write {key}"));
            Ok(())
        }

        fn delete_from_storage(&self, key: &str) -> HardwareResult<()> {
            self.calls.lock().push(format!("delete {key}"));
            Ok(())
        }
    }

    #[test]
    fn test_delivers_in_order() {
        let host = Arc::new(LogHost::default());
        let mut notifier = HostNotifier::start(host.clone(), 8).unwrap();

        notifier
            .post(HostMessage::WriteStorage {
                key: "a".into(),
                value: Value::Bool(true),
            })
            .unwrap();
        notifier
            .post(HostMessage::RequestConfigurationChange {
                device: 3,
                change_action: 44_100,
            })
            .unwrap();
        notifier
            .post(HostMessage::DeleteStorage { key: "b".into() })
            .unwrap();
        notifier.stop();

        assert_eq!(
            *host.calls.lock(),
            vec!["write a", "config 3 44100", "delete b"]
        );
    }

    #[test]
    fn test_post_after_stop_fails() {
        let host = Arc::new(LogHost::default());
        let mut notifier = HostNotifier::start(host, 8).unwrap();
        notifier.stop();

        let err = notifier
            .post(HostMessage::DeleteStorage { key: "x".into() })
            .unwrap_err();
        assert!(matches!(err, HardwareError::IllegalOperation(_)));
    }
}
