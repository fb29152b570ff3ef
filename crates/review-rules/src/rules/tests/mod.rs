mod common;
mod executor;
