mod common;

mod cancellation;
mod degraded;
mod engagement;
mod properties;
mod sequencing;
