pub mod rpc;
pub mod traits;
pub mod types;

pub use rpc::JsonRpcChain;
pub use traits::{ChainClient, ChainResult};
pub use types::{NetworkInfo, TxReceipt};
