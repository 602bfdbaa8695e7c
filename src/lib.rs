pub mod arg;
pub mod compose;
pub mod config;
pub mod logging;
pub mod normalize;
pub mod outcome;
pub mod pipeline;
pub mod registry;

pub use arg::Arg;
pub use compose::{compose, Composer, Composite};
pub use config::ComposeOptions;
pub use logging::{Level, LogSink, Logger, StdioSink};
pub use normalize::{normalize, normalize_all, Step};
pub use outcome::{Deferred, Outcome};
pub use pipeline::{compose_pipeline, compose_pipeline_with, parse_pipeline};
pub use registry::{Registry, Transform, TransformNotFoundError};
