//! Observability utilities.

mod logging;

pub use logging::{
    build_env_filter, init_logging, LogFormat, LoggingConfig, ENV_LOG, ENV_LOG_ANSI,
    ENV_LOG_FORMAT,
};
