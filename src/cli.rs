//! Subcommands of the isc-bridge binary.
//!
//! Everything except `config` and `contracts` goes through a [`Bridge`] over an in-process
//! core, the same path library callers take.

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use serde::Serialize;
use url::Url;

use isc_bridge::metadata::{ContractIdentity, Request};
use isc_bridge::types::{Assets, Bech32Address, EvmAddress};
use isc_bridge::{Bridge, CoreHandle, NetworkConfig};

/// Run `command` with its arguments
pub async fn run(command: &str, args: &[String], config_path: &Path) -> anyhow::Result<()> {
    let config = NetworkConfig::load_or_default(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match command {
        "config" => return run_config(args, &config, config_path),
        "contracts" => {
            contract_lines(&config).iter().for_each(|line| println!("{line}"));
            return Ok(());
        }
        _ => {}
    }

    let bridge = connect(&config)?;
    match command {
        "hname" => {
            let name = positional(args, 0, "hname <NAME>")?;
            let hname = bridge.hname(name).await?;
            println!("{} (0x{hname})", hname.value());
        }
        "agent-id" => {
            let address: EvmAddress = positional(args, 0, "agent-id <EVM_ADDRESS>")?
                .parse()
                .context("invalid EVM address")?;
            let chain = flag_value(args, "--chain").unwrap_or(config.chain_address.as_str());
            let agent_id = bridge.ethereum_agent_id(chain, address).await?;
            println!("0x{}", hex::encode(agent_id));
        }
        "encode" => {
            let request = parse_request(args, &config)?;
            let payload = bridge.encode_request(&request).await?;
            println!("{payload}");
        }
        "decode" => {
            let payload = positional(args, 0, "decode <HEX>")?;
            let bytes = hex::decode(payload.strip_prefix("0x").unwrap_or(payload))
                .context("payload is not hex")?;
            print_json(&bridge.decode_request(&bytes).await?)?;
        }
        "info" => print_json(&bridge.get_info().await?)?,
        "balance" => {
            let address: Bech32Address = positional(args, 0, "balance <L1_ADDRESS>")?
                .parse()
                .context("invalid L1 address")?;
            print_json(&bridge.get_balance(&config.chain_address, &address).await?)?;
        }
        "receipt" => {
            let request_id = positional(args, 0, "receipt <REQUEST_ID>")?;
            print_json(&bridge.get_receipt(&config.chain_address, request_id).await?)?;
        }
        other => bail!("unknown command '{other}', see --help"),
    }
    Ok(())
}

fn connect(config: &NetworkConfig) -> anyhow::Result<Bridge<CoreHandle>> {
    let url = Url::parse(&config.wasp_url)
        .with_context(|| format!("invalid wasp_url '{}'", config.wasp_url))?;
    let bridge = Bridge::connect(url)?;
    Ok(match config.request_timeout() {
        Some(timeout) => bridge.with_timeout(timeout),
        None => bridge,
    })
}

fn run_config(args: &[String], config: &NetworkConfig, path: &Path) -> anyhow::Result<()> {
    if args.iter().any(|a| a == "--init") {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        NetworkConfig::testnet().save_to_file(path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// EVM addresses of the chain's built-in contracts
fn contract_lines(config: &NetworkConfig) -> Vec<String> {
    let evm = &config.evm;
    vec![
        format!("magic              {}", evm.magic.to_hex()),
        format!("erc20-base-tokens  {}", evm.erc20_base_tokens.to_hex()),
        format!("erc721             {}", evm.erc721.to_hex()),
    ]
}

/// Build a request from `<CONTRACT> <ENTRY> [--gas N] [--base N] [--param K=HEX]...`
fn parse_request(args: &[String], config: &NetworkConfig) -> anyhow::Result<Request> {
    let usage = "encode <CONTRACT> <ENTRY> [--gas N] [--base N] [--param K=HEX]";
    let contract = positional(args, 0, usage)?;
    let entry_point = positional(args, 1, usage)?;

    let mut builder = Request::builder(contract, entry_point)
        .sender(ContractIdentity::Null)
        .gas_budget(config.gas_budget());

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--gas" => {
                i += 1;
                let gas = args.get(i).ok_or_else(|| anyhow!("--gas needs a value"))?;
                builder = builder.gas_budget(gas.parse().context("invalid --gas")?);
            }
            "--base" => {
                i += 1;
                let base = args.get(i).ok_or_else(|| anyhow!("--base needs a value"))?;
                builder = builder.allowance(Assets::base(base.parse().context("invalid --base")?));
            }
            "--param" => {
                i += 1;
                let param = args.get(i).ok_or_else(|| anyhow!("--param needs KEY=HEX"))?;
                let (key, value) = param
                    .split_once('=')
                    .ok_or_else(|| anyhow!("--param needs KEY=HEX, got '{param}'"))?;
                let value = hex::decode(value.strip_prefix("0x").unwrap_or(value))
                    .with_context(|| format!("param '{key}' is not hex"))?;
                builder = builder.param(key, value);
            }
            other => bail!("unexpected argument '{other}'"),
        }
        i += 1;
    }

    Ok(builder.build()?)
}

/// The `index`-th argument that is neither a `--flag` nor a flag's value
fn positional<'a>(args: &'a [String], index: usize, usage: &str) -> anyhow::Result<&'a str> {
    let mut seen = 0;
    let mut i = 0;
    while i < args.len() {
        if args[i].starts_with("--") {
            i += 2;
            continue;
        }
        if seen == index {
            return Ok(&args[i]);
        }
        seen += 1;
        i += 1;
    }
    Err(anyhow!("usage: isc-bridge {usage}"))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_request() {
        let config = NetworkConfig::testnet();
        let request = parse_request(
            &strings(&["accounts", "withdraw", "--base", "1304600"]),
            &config,
        )
        .unwrap();
        assert_eq!(
            request.encode().unwrap().to_hex(),
            "0x00025e4b3c410fcc9d914e008098d04f"
        );

        let request = parse_request(
            &strings(&["accounts", "transferAllowanceTo", "--gas", "5", "--param", "a=0x0102"]),
            &config,
        )
        .unwrap();
        assert_eq!(request.gas_budget(), 5);
        assert_eq!(request.param("a"), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_parse_request_errors() {
        let config = NetworkConfig::testnet();
        assert!(parse_request(&strings(&["accounts"]), &config).is_err());
        assert!(parse_request(&strings(&["a", "b", "--gas", "0"]), &config).is_err());
        assert!(parse_request(&strings(&["a", "b", "--param", "novalue"]), &config).is_err());
        assert!(parse_request(&strings(&["a", "b", "--bogus"]), &config).is_err());
    }

    #[test]
    fn test_contract_lines_follow_config() {
        let mut config = NetworkConfig::testnet();
        let lines = contract_lines(&config);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("0x1074000000000000000000000000000000000000"));
        assert!(lines[2].ends_with("0x1074030000000000000000000000000000000000"));

        config.evm.erc721 = EvmAddress::from_bytes([0xab; 20]);
        assert!(contract_lines(&config)[2].ends_with(&"ab".repeat(20)));
    }

    #[test]
    fn test_positional_skips_flags() {
        let args = strings(&["--chain", "0x01", "0xabc"]);
        assert_eq!(positional(&args, 0, "").unwrap(), "0xabc");
        assert!(positional(&args, 1, "").is_err());
        assert_eq!(flag_value(&args, "--chain"), Some("0x01"));
        assert_eq!(flag_value(&args, "--missing"), None);
    }
}
