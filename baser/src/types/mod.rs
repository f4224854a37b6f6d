//! Types shared by the transmit and receive pipelines.

mod block;
mod frame;
mod xgmii;

pub use block::*;
pub use frame::*;
pub use xgmii::*;
