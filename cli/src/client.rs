//! Chain client: shells out to the chain CLI binary
//!
//! Every transaction goes through `<binary> tx wasm ...` with JSON
//! output, every query through `<binary> query wasm contract-state
//! smart`. Store and broadcast calls retry transient failures;
//! instantiate and execute surface the first failure to the caller.

use colored::Colorize;
use serde_json::Value;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::config::NetworkConfig;

const BROADCAST_ATTEMPTS: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("chain command failed: {0}")]
    Command(String),
    #[error("unexpected chain output: {0}")]
    Parse(String),
}

/// Transaction and query surface the harness needs from the chain.
pub trait ChainClient {
    /// Upload a wasm blob, returning its code id.
    fn store_code(&self, wasm_path: &Path) -> Result<u64, ChainError>;

    /// Instantiate a stored code, returning the contract address.
    /// `funds` is a coin string such as `"1000000uusd"`.
    fn instantiate(
        &self,
        code_id: u64,
        label: &str,
        init_msg: &Value,
        funds: Option<&str>,
    ) -> Result<String, ChainError>;

    /// Execute a contract message, returning the raw transaction log.
    fn execute(
        &self,
        contract: &str,
        msg: &Value,
        funds: Option<&str>,
    ) -> Result<Value, ChainError>;

    /// Smart-query a contract, returning the response payload.
    fn query(&self, contract: &str, msg: &Value) -> Result<Value, ChainError>;
}

/// `ChainClient` over the chain's own CLI binary.
pub struct CliChain<'a> {
    config: &'a NetworkConfig,
}

impl<'a> CliChain<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self { config }
    }

    fn tx_command(&self) -> Command {
        let mut cmd = Command::new(&self.config.chain_binary);
        cmd.arg("tx")
            .arg("wasm")
            .args(["--from", self.config.key_name.as_str()])
            .args(["--chain-id", self.config.chain_id.as_str()])
            .args(["--node", self.config.node_url.as_str()])
            .args(["--gas", "auto"])
            .args(["--gas-adjustment", "1.4"])
            .args(["--broadcast-mode", "block"])
            .args(["--output", "json"])
            .arg("-y");
        cmd
    }

    fn run(&self, cmd: &mut Command) -> Result<Value, ChainError> {
        log::debug!("running {:?}", cmd);
        let output = cmd.output().map_err(|source| ChainError::Spawn {
            binary: self.config.chain_binary.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(ChainError::Command(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let value: Value = serde_json::from_str(stdout.trim())
            .map_err(|_| ChainError::Parse(stdout.into_owned()))?;

        // Accepted by the node but failed in the wasm VM
        if let Some(code) = value.get("code").and_then(Value::as_u64) {
            if code != 0 {
                let raw_log = value
                    .get("raw_log")
                    .and_then(Value::as_str)
                    .unwrap_or("no raw_log");
                return Err(ChainError::Command(raw_log.to_string()));
            }
        }
        Ok(value)
    }

    fn run_tx_with_retry(&self, build: impl Fn(&Self) -> Command) -> Result<Value, ChainError> {
        let mut last_err = None;
        for attempt in 1..=BROADCAST_ATTEMPTS {
            match self.run(&mut build(self)) {
                Ok(value) => return Ok(value),
                Err(e @ ChainError::Spawn { .. }) => return Err(e),
                Err(e) => {
                    log::warn!("broadcast attempt {} failed: {}", attempt, e);
                    println!("{}", format!("  retrying ({}): {}", attempt, e).dimmed());
                    last_err = Some(e);
                    thread::sleep(RETRY_DELAY);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ChainError::Command("no attempts made".to_string())))
    }
}

impl ChainClient for CliChain<'_> {
    fn store_code(&self, wasm_path: &Path) -> Result<u64, ChainError> {
        let value = self.run_tx_with_retry(|c| {
            let mut cmd = c.tx_command();
            cmd.arg("store").arg(wasm_path);
            cmd
        })?;
        let code_id = extract_event_attr(&value, "store_code", "code_id").ok_or_else(|| {
            ChainError::Parse(format!("no code_id in store response for {}", wasm_path.display()))
        })?;
        code_id
            .parse()
            .map_err(|_| ChainError::Parse(format!("bad code_id: {}", code_id)))
    }

    fn instantiate(
        &self,
        code_id: u64,
        label: &str,
        init_msg: &Value,
        funds: Option<&str>,
    ) -> Result<String, ChainError> {
        let value = self.run_tx_with_retry(|c| {
            let mut cmd = c.tx_command();
            cmd.arg("instantiate")
                .arg(code_id.to_string())
                .arg(init_msg.to_string())
                .args(["--label", label])
                .arg("--no-admin");
            if let Some(coins) = funds {
                cmd.args(["--amount", coins]);
            }
            cmd
        })?;
        extract_event_attr(&value, "instantiate", "_contract_address")
            .ok_or_else(|| ChainError::Parse(format!("no contract address for {}", label)))
    }

    fn execute(
        &self,
        contract: &str,
        msg: &Value,
        funds: Option<&str>,
    ) -> Result<Value, ChainError> {
        self.run_tx_with_retry(|c| {
            let mut cmd = c.tx_command();
            cmd.arg("execute").arg(contract).arg(msg.to_string());
            if let Some(coins) = funds {
                cmd.args(["--amount", coins]);
            }
            cmd
        })
    }

    fn query(&self, contract: &str, msg: &Value) -> Result<Value, ChainError> {
        let mut cmd = Command::new(&self.config.chain_binary);
        cmd.arg("query")
            .arg("wasm")
            .arg("contract-state")
            .arg("smart")
            .arg(contract)
            .arg(msg.to_string())
            .args(["--node", self.config.node_url.as_str()])
            .args(["--output", "json"]);
        let value = self.run(&mut cmd)?;
        value
            .get("data")
            .cloned()
            .ok_or_else(|| ChainError::Parse(format!("query response without data: {}", value)))
    }
}

/// Find an attribute in the transaction log events, searching both the
/// top-level `events` array and per-message `logs`.
pub fn extract_event_attr(tx: &Value, event_type: &str, key: &str) -> Option<String> {
    let event_lists = [
        tx.get("events"),
        tx.pointer("/logs/0/events"),
        tx.pointer("/tx_response/logs/0/events"),
    ];
    for events in event_lists.into_iter().flatten() {
        let Some(events) = events.as_array() else {
            continue;
        };
        for event in events {
            if event.get("type").and_then(Value::as_str) != Some(event_type) {
                continue;
            }
            let attrs = event
                .get("attributes")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for attr in attrs {
                if attr.get("key").and_then(Value::as_str) == Some(key) {
                    return attr
                        .get("value")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                }
            }
        }
    }
    None
}

/// Shorten a bech32 address for display.
pub fn format_addr(addr: &str) -> String {
    if addr.len() <= 16 {
        return addr.bright_yellow().to_string();
    }
    format!("{}...{}", &addr[0..8], &addr[addr.len() - 8..])
        .bright_yellow()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_from_logs() {
        let tx = json!({
            "logs": [{
                "events": [
                    {
                        "type": "message",
                        "attributes": [{"key": "action", "value": "store_code"}]
                    },
                    {
                        "type": "store_code",
                        "attributes": [{"key": "code_id", "value": "42"}]
                    }
                ]
            }]
        });
        assert_eq!(
            extract_event_attr(&tx, "store_code", "code_id"),
            Some("42".to_string())
        );
        assert_eq!(extract_event_attr(&tx, "store_code", "missing"), None);
        assert_eq!(extract_event_attr(&tx, "instantiate", "code_id"), None);
    }

    #[test]
    fn test_extract_instantiate_address() {
        let tx = json!({
            "events": [{
                "type": "instantiate",
                "attributes": [
                    {"key": "_contract_address", "value": "terra1note"},
                    {"key": "code_id", "value": "7"}
                ]
            }]
        });
        assert_eq!(
            extract_event_attr(&tx, "instantiate", "_contract_address"),
            Some("terra1note".to_string())
        );
    }
}
