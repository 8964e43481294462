mod sink;

pub use sink::JsonFileSink;
pub use sink::ResultSink;
