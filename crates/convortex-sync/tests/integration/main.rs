mod common;
mod test_sync_flow;
mod test_sandbox_flow;
