// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line gNMI client.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand};
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use gnmi_rs::api::gnmi::CapabilityResponse;
use gnmi_rs::config::GnmiConfig;
use gnmi_rs::flatten::{flatten_get_response, flatten_subscribe_response, FlatUpdate};
use gnmi_rs::{
    ClientBuilder, DataType, DeviceOs, Encoding, GnmiClient, RequestMode, SubMode,
};

#[derive(Parser)]
#[command(name = "gnmi-cli", version, about = "gNMI command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieve the target's capabilities.
    Capabilities {
        #[command(flatten)]
        conn: ConnectionArgs,
    },
    /// Snapshot data under one or more xpaths.
    Get {
        #[command(flatten)]
        conn: ConnectionArgs,
        /// XPath to retrieve; repeatable.
        #[arg(short = 'x', long = "xpath", required = true)]
        xpaths: Vec<String>,
        /// Data class: all, config, state or operational.
        #[arg(long, default_value = "all")]
        data_type: String,
        /// Value encoding; defaults to the OS variant's choice.
        #[arg(long)]
        encoding: Option<String>,
    },
    /// Run CLI commands through the gNMI passthrough (IOS XR).
    GetCli {
        #[command(flatten)]
        conn: ConnectionArgs,
        /// Command to run; repeatable.
        #[arg(short = 'c', long = "command", required = true)]
        commands: Vec<String>,
    },
    /// Apply configuration changes.
    Set {
        #[command(flatten)]
        conn: ConnectionArgs,
        /// JSON document to merge, inline or @file; repeatable.
        #[arg(long = "update-json")]
        updates: Vec<String>,
        /// JSON document to replace with, inline or @file; repeatable.
        #[arg(long = "replace-json")]
        replaces: Vec<String>,
        /// XPath to delete; repeatable.
        #[arg(long = "delete")]
        deletes: Vec<String>,
    },
    /// Stream telemetry for one or more xpaths.
    Subscribe {
        #[command(flatten)]
        conn: ConnectionArgs,
        /// XPath to subscribe to; repeatable.
        #[arg(short = 'x', long = "xpath", required = true)]
        xpaths: Vec<String>,
        /// Exchange lifetime: stream, once or poll.
        #[arg(long, default_value = "stream")]
        mode: String,
        /// Per-path mode: target_defined, on_change or sample.
        #[arg(long, default_value = "sample")]
        sub_mode: String,
        /// Sample interval in seconds.
        #[arg(long, default_value_t = 10)]
        interval: u64,
        /// Value encoding; defaults to the OS variant's choice.
        #[arg(long)]
        encoding: Option<String>,
        /// Stop once the initial sync marker arrives.
        #[arg(long)]
        sync_stop: bool,
        /// Skip the initial snapshot.
        #[arg(long)]
        updates_only: bool,
    },
}

#[derive(Args)]
struct ConnectionArgs {
    /// Target as host or host:port (port defaults to 9339). May be
    /// omitted when --context is given.
    target: Option<String>,

    /// Named context from the config file (~/.gnmi/config or
    /// $GNMI_CONFIG).
    #[arg(long)]
    context: Option<String>,

    /// Network OS variant: generic, xr, xe or nx.
    #[arg(long)]
    os: Option<String>,

    /// PEM file with root certificates.
    #[arg(long)]
    root_certificates: Option<PathBuf>,

    /// PEM file with the client private key.
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// PEM file with the client certificate chain.
    #[arg(long)]
    certificate_chain: Option<PathBuf>,

    /// Use a cleartext channel.
    #[arg(long)]
    insecure: bool,

    /// Verify the target's certificate against this name.
    #[arg(long)]
    ssl_target_override: Option<String>,

    /// Derive the override name from the root certificate.
    #[arg(long)]
    auto_ssl_target_override: bool,

    /// Username for call metadata.
    #[arg(short, long)]
    username: Option<String>,

    /// Password for call metadata; prefer the GNMI_PASSWORD environment
    /// variable.
    #[arg(short, long)]
    password: Option<String>,

    /// Per-RPC timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Emit JSON instead of human-readable output.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

impl ConnectionArgs {
    /// Merge config-file context values under explicit flags, then build
    /// the client.
    async fn connect(&self) -> anyhow::Result<GnmiClient> {
        let context = match &self.context {
            Some(name) => {
                let config = GnmiConfig::load_with_env()
                    .context("unable to load gNMI config file")?;
                Some(
                    config
                        .get_context(name)
                        .with_context(|| format!("context {name:?} not found in config file"))?
                        .clone(),
                )
            }
            None => None,
        };

        let target = self
            .target
            .clone()
            .or_else(|| context.as_ref().map(|c| c.target.clone()))
            .context("a target argument or --context is required")?;

        let os_name = self
            .os
            .clone()
            .or_else(|| context.as_ref().and_then(|c| c.os.clone()))
            .unwrap_or_default();
        let os: DeviceOs = os_name.parse()?;

        let mut builder = ClientBuilder::new(target).os(os);

        let root = self
            .root_certificates
            .clone()
            .or_else(|| context.as_ref().and_then(|c| c.root_certificates.clone()));
        let key = self
            .private_key
            .clone()
            .or_else(|| context.as_ref().and_then(|c| c.private_key.clone()));
        let chain = self
            .certificate_chain
            .clone()
            .or_else(|| context.as_ref().and_then(|c| c.certificate_chain.clone()));
        let insecure = self.insecure || context.as_ref().is_some_and(|c| c.insecure);

        builder = if insecure {
            builder.insecure()
        } else if root.is_some() || key.is_some() || chain.is_some() {
            builder.secure_from_files(root, key, chain)
        } else {
            // No certificates on hand: trust what the target presents.
            builder.secure_from_target()
        };

        if let Some(name) = self
            .ssl_target_override
            .clone()
            .or_else(|| context.as_ref().and_then(|c| c.ssl_target_override.clone()))
        {
            builder = builder.ssl_target_override(name);
        } else if self.auto_ssl_target_override
            || context.as_ref().is_some_and(|c| c.auto_ssl_target_override)
        {
            builder = builder.ssl_target_override_from_certificate();
        }

        let username = self
            .username
            .clone()
            .or_else(|| context.as_ref().and_then(|c| c.username.clone()));
        if let Some(username) = username {
            let password = match &self.password {
                Some(password) => password.clone(),
                None => std::env::var("GNMI_PASSWORD")
                    .context("--username given but no --password or GNMI_PASSWORD")?,
            };
            builder = builder.call_authentication(username, password);
        }

        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(builder.construct().await?)
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "gnmi_rs=debug,gnmi_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_capabilities(response: &CapabilityResponse, json: bool) -> anyhow::Result<()> {
    if json {
        let models: Vec<_> = response
            .supported_models
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "organization": m.organization,
                    "version": m.version,
                })
            })
            .collect();
        let encodings: Vec<String> = response
            .supported_encodings
            .iter()
            .map(|e| Encoding::from(*e).to_string())
            .collect();
        let doc = serde_json::json!({
            "gnmi_version": response.g_nmi_version,
            "supported_encodings": encodings,
            "supported_models": models,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("gNMI version: {}", response.g_nmi_version);
        let encodings: Vec<String> = response
            .supported_encodings
            .iter()
            .map(|e| Encoding::from(*e).to_string())
            .collect();
        println!("Encodings:    {}", encodings.join(", "));
        println!("Models:       {}", response.supported_models.len());
        for model in &response.supported_models {
            println!("  {} {} ({})", model.name, model.version, model.organization);
        }
    }
    Ok(())
}

fn print_updates(updates: &[FlatUpdate], json: bool) -> anyhow::Result<()> {
    if json {
        let entries: Vec<_> = updates
            .iter()
            .map(|u| {
                serde_json::json!({
                    "xpath": u.xpath,
                    "value": u.value,
                    "deleted": u.deleted,
                    "timestamp": u.timestamp,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for update in updates {
            if update.deleted {
                println!("{} (deleted)", update.xpath);
            } else {
                println!("{} = {}", update.xpath, update.value);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Capabilities { conn } => {
            init_logging(conn.debug);
            let client = conn.connect().await?;
            let response = client.capabilities().await?;
            print_capabilities(&response, conn.json)?;
        }
        Command::Get {
            conn,
            xpaths,
            data_type,
            encoding,
        } => {
            init_logging(conn.debug);
            let data_type: DataType = data_type.parse()?;
            let encoding = encoding.map(|e| e.parse::<Encoding>()).transpose()?;
            let client = conn.connect().await?;
            let xpaths: Vec<&str> = xpaths.iter().map(String::as_str).collect();
            let response = client.get_xpaths(&xpaths, data_type, encoding).await?;
            print_updates(&flatten_get_response(&response), conn.json)?;
        }
        Command::GetCli { conn, commands } => {
            init_logging(conn.debug);
            let client = conn.connect().await?;
            let commands: Vec<&str> = commands.iter().map(String::as_str).collect();
            let response = client.get_cli(&commands).await?;
            for update in flatten_get_response(&response) {
                match update.value.as_str() {
                    Some(text) => println!("{text}"),
                    None => println!("{}", update.value),
                }
            }
        }
        Command::Set {
            conn,
            updates,
            replaces,
            deletes,
        } => {
            init_logging(conn.debug);
            if updates.is_empty() && replaces.is_empty() && deletes.is_empty() {
                bail!("set requires at least one --update-json, --replace-json or --delete");
            }
            let client = conn.connect().await?;
            let response = if deletes.is_empty() {
                let updates = read_json_args(&updates)?;
                let replaces = read_json_args(&replaces)?;
                let updates: Vec<&str> = updates.iter().map(String::as_str).collect();
                let replaces: Vec<&str> = replaces.iter().map(String::as_str).collect();
                client.set_json(&updates, &replaces).await?
            } else if updates.is_empty() && replaces.is_empty() {
                let deletes: Vec<&str> = deletes.iter().map(String::as_str).collect();
                client.delete_xpaths(&deletes, None).await?
            } else {
                bail!("combine deletes with JSON changes by issuing two set commands");
            };
            for result in &response.response {
                let op = op_name(result.op);
                let xpath = result
                    .path
                    .as_ref()
                    .map(gnmi_rs::path::path_to_xpath)
                    .unwrap_or_default();
                println!("{op} {xpath}");
            }
        }
        Command::Subscribe {
            conn,
            xpaths,
            mode,
            sub_mode,
            interval,
            encoding,
            sync_stop,
            updates_only,
        } => {
            init_logging(conn.debug);
            let mode: RequestMode = mode.parse()?;
            let sub_mode: SubMode = sub_mode.parse()?;
            let client = conn.connect().await?;
            let xpaths: Vec<&str> = xpaths.iter().map(String::as_str).collect();
            let mut builder = client
                .subscription_for(&xpaths)?
                .mode(mode)
                .sub_mode(sub_mode)
                .sample_interval(Duration::from_secs(interval))
                .sync_stop(sync_stop)
                .updates_only(updates_only);
            if let Some(encoding) = encoding {
                builder = builder.encoding(encoding.parse::<Encoding>()?);
            }
            let mut stream = client.subscribe(builder.build()?).await?;
            while let Some(response) = stream.next().await {
                let response = response?;
                print_updates(&flatten_subscribe_response(&response), conn.json)?;
            }
        }
    }
    Ok(())
}

/// Resolve JSON arguments, reading `@file` references from disk.
fn read_json_args(args: &[String]) -> anyhow::Result<Vec<String>> {
    args.iter()
        .map(|arg| match arg.strip_prefix('@') {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("unable to read JSON file {path}")),
            None => Ok(arg.clone()),
        })
        .collect()
}

/// Human name for an UpdateResult operation code.
fn op_name(op: i32) -> &'static str {
    use gnmi_rs::api::gnmi::update_result::Operation;
    match Operation::try_from(op) {
        Ok(Operation::Delete) => "deleted",
        Ok(Operation::Replace) => "replaced",
        Ok(Operation::Update) => "updated",
        _ => "invalid",
    }
}
