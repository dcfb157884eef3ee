pub mod node_client;
pub mod rpc_client;
pub mod scheduler;
pub mod transfer_filter;
pub mod transfer_scanner;

pub use node_client::NodeClient;
pub use rpc_client::{LogFilter, NodeRpc, RpcClient};
pub use scheduler::{Scheduler, ShutdownHandle};
pub use transfer_filter::{normalize_address, validate_address, WatchedAddress};
pub use transfer_scanner::{TickReport, TransferScanner};
