mod common;

mod commission;
mod store;
