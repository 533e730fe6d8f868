#![forbid(unsafe_code)]

mod setup;

pub use setup::{demo_classes, demo_world, init_tracing, write_output, DemoClasses};
