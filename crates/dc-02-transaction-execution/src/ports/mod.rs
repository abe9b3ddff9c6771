pub mod inbound;
pub mod outbound;

pub use inbound::BlockExecution;
pub use outbound::{VmExecutor, VmReceipt};
