pub mod outbound;

pub use outbound::{BatchOperation, BlockchainListener, KeyValueStore, ScanResult};
