//! isc-bridge - ISC request metadata and node queries
//!
//! Single binary with subcommands:
//!   isc-bridge hname       - Hname of a contract or entry point name
//!   isc-bridge agent-id    - Agent id of an EVM address
//!   isc-bridge encode      - Encode a request payload
//!   isc-bridge decode      - Decode a request payload
//!   isc-bridge info        - Node info
//!   isc-bridge balance     - L2 balance of an L1 address
//!   isc-bridge receipt     - Receipt of a processed request
//!   isc-bridge contracts   - EVM addresses of the built-in contracts
//!   isc-bridge config      - Show or write the network config

mod cli;

use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let (config_path, args) = split_config_flag(&args[1..]);

    match args.first().map(String::as_str) {
        Some("--help" | "-h") | None => print_help(),
        Some("--version" | "-V") => println!("isc-bridge {}", isc_bridge::VERSION),
        Some(command) => {
            if let Err(e) = isc_bridge::logger::init_logger() {
                eprintln!("Warning: {e}");
            }
            let path = config_path.unwrap_or_else(isc_bridge::NetworkConfig::default_path);
            if let Err(e) = cli::run(command, &args[1..], &path).await {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

/// Pull `--config <PATH>` out of the arguments, wherever it appears
fn split_config_flag(args: &[String]) -> (Option<PathBuf>, Vec<String>) {
    let mut config_path = None;
    let mut rest = Vec::with_capacity(args.len());

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                }
            }
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }

    (config_path, rest)
}

fn print_help() {
    println!("isc-bridge v{}", isc_bridge::VERSION);
    println!("Request metadata codec and node queries for IOTA Smart Contracts chains");
    println!();
    println!("USAGE:");
    println!("    isc-bridge [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    hname <NAME>                 Hname of a contract or entry point name");
    println!("    agent-id <EVM_ADDRESS>       Agent id bytes of an EVM address");
    println!("                  --chain <ID>   Chain id or alias address (default: configured chain)");
    println!("    encode <CONTRACT> <ENTRY>    Encode a request payload");
    println!("                  --gas <N>      Gas budget (default: configured budget)");
    println!("                  --base <N>     Base tokens in the allowance");
    println!("                  --param <K=HEX> Add a param, may repeat");
    println!("    decode <HEX>                 Decode a request payload");
    println!("    info                         Node info");
    println!("    balance <L1_ADDRESS>         L2 balance on the configured chain");
    println!("    receipt <REQUEST_ID>         Receipt of a processed request");
    println!("    contracts                    EVM addresses of the built-in contracts");
    println!("    config                       Print the network config");
    println!("                  --init         Write the defaults to the config path");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>  Config file (default: ~/.isc-bridge/config.toml)");
    println!("    -h, --help           Print help");
    println!("    -V, --version        Print version");
    println!();
    println!("EXAMPLES:");
    println!("    isc-bridge hname accounts");
    println!("    isc-bridge encode accounts withdraw --base 1304600");
    println!("    isc-bridge decode 0x00025e4b3c410fcc9d914e008098d04f");
    println!("    RUST_LOG=debug isc-bridge info");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_config_flag_anywhere() {
        let (path, rest) = split_config_flag(&strings(&["info", "--config", "/tmp/c.toml"]));
        assert_eq!(path, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(rest, strings(&["info"]));

        let (path, rest) = split_config_flag(&strings(&["-c", "x.toml", "hname", "evm"]));
        assert_eq!(path, Some(PathBuf::from("x.toml")));
        assert_eq!(rest, strings(&["hname", "evm"]));

        let (path, _) = split_config_flag(&strings(&["decode", "0x00"]));
        assert_eq!(path, None);
    }
}
