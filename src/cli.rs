//! Command line interface for the `zmq-async-proxy` demo binary.
//!
//! Shared with `build.rs`, which renders the man page from it.

use clap::Parser;

/// Command line arguments for the `zmq-async-proxy` binary.
#[derive(Debug, Parser)]
#[command(
    name = "zmq-async-proxy",
    version,
    about = "Run request/reply clients through an in-process ROUTER/DEALER proxy"
)]
pub struct Cli {
    /// Number of requests each client sends.
    #[arg(short, long, default_value_t = 3)]
    pub requests: usize,

    /// Number of concurrent clients.
    #[arg(short, long, default_value_t = 2)]
    pub clients: usize,

    /// Frontend endpoint the clients connect to.
    #[arg(long, default_value = "inproc://frontend")]
    pub frontend: String,

    /// Backend endpoint the worker connects to.
    #[arg(long, default_value = "inproc://backend")]
    pub backend: String,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn defaults_are_applied() {
        let cli = Cli::parse_from(["zmq-async-proxy"]);
        assert_eq!(cli.requests, 3);
        assert_eq!(cli.clients, 2);
        assert_eq!(cli.frontend, "inproc://frontend");
    }

    #[test]
    fn parses_counts() {
        let cli = Cli::parse_from(["zmq-async-proxy", "--requests", "5", "-c", "1"]);
        assert_eq!(cli.requests, 5);
        assert_eq!(cli.clients, 1);
    }
}
