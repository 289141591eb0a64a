pub mod gateway;

pub use gateway::PortfolioGateway;
