//! The submission entry point a Logpass node exposes to whatever sits
//! in front of it (API layer, gossip relay — out of scope here):
//! decode, validate against the unconfirmed view, stage, reply. One
//! dedicated worker thread drains requests serially against one open
//! [`Database`], mirroring `logpass_core`'s own background-flush
//! worker rather than reaching for an async runtime.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use logpass_core::database::Database;
use logpass_core::runtime::Worker;
use logpass_core::transactions::Transaction;

#[derive(Debug, Clone)]
pub struct SubmitResult {
    pub accepted: bool,
    pub reason: Option<String>,
    pub transaction_id: Option<String>,
}

pub struct SubmissionEntryPoint {
    worker: Worker,
    database: Arc<Database>,
}

impl SubmissionEntryPoint {
    pub fn new(database: Arc<Database>) -> Self {
        SubmissionEntryPoint { worker: Worker::spawn("logpass-node-submit"), database }
    }

    /// Decodes `bytes`, validates and executes it against `block_id`'s
    /// unconfirmed view, and reports the outcome on `reply` exactly
    /// once, asynchronously, per the submission contract.
    pub fn submit_transaction(&self, block_id: u32, bytes: Vec<u8>, reply: Sender<SubmitResult>) {
        let database = self.database.clone();
        self.worker.submit(move || {
            let result = match Transaction::load(bytes) {
                Ok(tx) => {
                    let transaction_id = tx.id.to_string();
                    match database.validate_and_execute(block_id, tx) {
                        Ok(()) => {
                            SubmitResult { accepted: true, reason: None, transaction_id: Some(transaction_id) }
                        }
                        Err(err) => SubmitResult { accepted: false, reason: Some(err.to_string()), transaction_id: None },
                    }
                }
                Err(err) => SubmitResult { accepted: false, reason: Some(err.to_string()), transaction_id: None },
            };
            let _ = reply.send(result);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logpass_core::config::Config;
    use logpass_core::crypto::PrivateKey;
    use logpass_core::transactions::init::InitTransaction;
    use std::sync::mpsc::channel;

    #[test]
    fn accepts_a_valid_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let database = Arc::new(Database::open(dir.path(), Config::default()).unwrap());
        let entry_point = SubmissionEntryPoint::new(database);

        let key = PrivateKey::generate();
        let init = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        let bytes = init.serialize();

        let (tx, rx) = channel();
        entry_point.submit_transaction(1, bytes, tx);
        let result = rx.recv().unwrap();
        assert!(result.accepted);
        assert!(result.transaction_id.is_some());
    }

    #[test]
    fn reports_decode_failures_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let database = Arc::new(Database::open(dir.path(), Config::default()).unwrap());
        let entry_point = SubmissionEntryPoint::new(database);

        let (tx, rx) = channel();
        entry_point.submit_transaction(1, vec![0xff; 4], tx);
        let result = rx.recv().unwrap();
        assert!(!result.accepted);
        assert!(result.reason.is_some());
    }
}
