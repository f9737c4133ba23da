pub mod bi_flow;
pub mod conn_state;
pub mod flow;
pub mod util;
