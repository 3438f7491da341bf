pub mod logging;
pub mod sigv4;
