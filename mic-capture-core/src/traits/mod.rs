pub mod analyser;
pub mod delegate;
pub mod encoder;
pub mod stream;
