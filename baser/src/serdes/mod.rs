//! SERDES interface models: frames to interface words and back.
//!
//! A [`SerdesSource`] and a [`SerdesSink`] built from equal configurations form a loopback
//! when every word from [`SerdesSource::tick`] is passed to [`SerdesSink::tick`].

mod sink;
mod source;

pub use sink::SerdesSink;
pub use source::SerdesSource;
