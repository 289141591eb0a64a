pub mod decrypt;
pub mod pipeline;

pub use decrypt::ScoreDecryptor;
pub use pipeline::ScoreIntake;
