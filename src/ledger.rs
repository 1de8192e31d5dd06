//! The L1 ledger client, consumed as a collaborator.
//!
//! Building, signing and submitting transactions is the wallet's job; this
//! crate only hands over output descriptions and polls for inclusion.

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::InclusionConfig;
use crate::isc::BasicOutputSpec;
use crate::{Error, Result};

macro_rules! id32 {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Create from raw bytes
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Get the underlying bytes
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({self})", stringify!($name))
            }
        }
    };
}

id32!(
    /// Id of a submitted transaction
    TransactionId
);

id32!(
    /// Id of the block a transaction was included in
    BlockId
);

/// What the bridge needs from a wallet or ledger client.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Build, sign and submit a transaction creating `outputs`
    async fn send_outputs(&self, outputs: &[BasicOutputSpec]) -> Result<TransactionId>;

    /// Block that included `tx`, `None` while pending
    async fn included_block(&self, tx: &TransactionId) -> Result<Option<BlockId>>;
}

/// Poll `ledger` until `tx` is included, at most `config.max_attempts` times.
pub async fn await_inclusion<L: LedgerClient + ?Sized>(
    ledger: &L,
    tx: &TransactionId,
    config: &InclusionConfig,
) -> Result<BlockId> {
    for attempt in 1..=config.max_attempts {
        match ledger.included_block(tx).await {
            Ok(Some(block)) => {
                info!(%tx, %block, attempt, "transaction included");
                return Ok(block);
            }
            Ok(None) => debug!(%tx, attempt, "transaction pending"),
            Err(e) => warn!(%tx, attempt, error = %e, "inclusion check failed, retrying"),
        }
        if attempt < config.max_attempts {
            tokio::time::sleep(config.poll_interval()).await;
        }
    }

    Err(Error::Ledger(format!(
        "transaction {tx} not included after {} attempts",
        config.max_attempts
    )))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Ledger that includes a transaction after a fixed number of polls
    pub(crate) struct MockLedger {
        pub(crate) include_after: u32,
        pub(crate) polls: AtomicU32,
        pub(crate) sent: Mutex<Vec<BasicOutputSpec>>,
    }

    impl MockLedger {
        pub(crate) fn new(include_after: u32) -> Self {
            Self {
                include_after,
                polls: AtomicU32::new(0),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LedgerClient for MockLedger {
        async fn send_outputs(&self, outputs: &[BasicOutputSpec]) -> Result<TransactionId> {
            self.sent.lock().unwrap().extend_from_slice(outputs);
            Ok(TransactionId::from_bytes([0xaa; 32]))
        }

        async fn included_block(&self, _tx: &TransactionId) -> Result<Option<BlockId>> {
            let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if polls == 1 {
                return Err(Error::Ledger("node unavailable".into()));
            }
            Ok((polls >= self.include_after).then(|| BlockId::from_bytes([0xbb; 32])))
        }
    }

    fn fast(max_attempts: u32) -> InclusionConfig {
        InclusionConfig {
            poll_interval_ms: 1,
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_included_after_retries() {
        let ledger = MockLedger::new(3);
        let tx = TransactionId::from_bytes([1; 32]);

        let block = await_inclusion(&ledger, &tx, &fast(5)).await.unwrap();
        assert_eq!(block, BlockId::from_bytes([0xbb; 32]));
        assert_eq!(ledger.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let ledger = MockLedger::new(u32::MAX);
        let tx = TransactionId::from_bytes([1; 32]);

        let err = await_inclusion(&ledger, &tx, &fast(4)).await.unwrap_err();
        assert!(matches!(err, Error::Ledger(ref m) if m.contains("after 4 attempts")));
        assert_eq!(ledger.polls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_id_display() {
        let tx = TransactionId::from_bytes([0x0f; 32]);
        assert!(tx.to_string().starts_with("0x0f0f"));
        assert_eq!(tx.to_string().len(), 66);
    }
}
