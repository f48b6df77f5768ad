pub(crate) mod utils;

mod test_bridge;
mod test_sink;
