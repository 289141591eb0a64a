pub mod abi;
pub mod gateway;
pub mod pool;

pub use gateway::{ContractGateway, TokenInfo};
pub use pool::RpcPool;
