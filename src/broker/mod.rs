pub mod engine;
pub mod history;
pub mod message;

pub use engine::{Broker, Registration, SlowConsumerPolicy};
pub use history::HistoryRing;
pub use message::{ClientId, InitEnvelope, Message};
