mod common;
mod test_relay_server;
