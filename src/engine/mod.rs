//! The four long-lived concurrent loops (§4.D–§4.F, §4.H), each its own
//! `tokio::task`, coupled only through the queues and tables `run` owns
//! (§5, §9 "no global mutable state").

pub mod decoder;
pub mod dialer;
pub mod discovery;
pub mod resolver;
