//! Pin Authorizer - certificate-chain pinning authorizer

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use pin_authorizer::{
    Decision,
    authorizer::{Authorizer, Evaluation},
    chain::{ChainRetriever, TlsChainRetriever},
    cli::{Cli, Command, FetchFormat},
    config::Config,
    server, setup_tracing,
    source::{SecretPinSource, pin_record_json},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::Check) => run_check(&config).await,
        Some(Command::Fetch { host, port, format }) => {
            run_fetch(&config, &host, port, format).await
        }
        Some(Command::Serve { port, host }) => run_server(config, port, host).await,
        None => run_server(config, None, None).await,
    }
}

fn build_authorizer(config: &Config) -> pin_authorizer::Result<Authorizer> {
    let pins = SecretPinSource::from_config(&config.pins)?;
    let retriever = TlsChainRetriever::from_config(&config.tls)?;
    Ok(Authorizer::new(Arc::new(pins), Arc::new(retriever)))
}

/// Run the HTTP authorizer
async fn run_server(mut config: Config, port: Option<u16>, host: Option<String>) -> ExitCode {
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    let authorizer = match build_authorizer(&config) {
        Ok(a) => a,
        Err(e) => {
            error!("Failed to create authorizer: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        "Starting pin authorizer"
    );

    if let Err(e) = server::run(&config.server, authorizer).await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}

/// Evaluate the configured pins once
async fn run_check(config: &Config) -> ExitCode {
    let authorizer = match build_authorizer(config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("❌ Failed to create authorizer: {e}");
            return ExitCode::FAILURE;
        }
    };

    let evaluation = authorizer.evaluate().await;
    match &evaluation {
        Evaluation::ConfigFailed { reason } => {
            println!("Pinned configuration unusable: {reason}");
        }
        Evaluation::Compared {
            target,
            chain_length,
            results,
        } => {
            println!("{target}: retrieved {chain_length} certificate(s)");
            for (role, matched) in results.iter() {
                let mark = if matched { "✅" } else { "❌" };
                println!("  {mark} {role}");
            }
        }
    }

    let decision = evaluation.decision();
    println!("Decision: {decision}");
    if decision == Decision::Allow {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Print the live verified chain of a host
async fn run_fetch(config: &Config, host: &str, port: u16, format: FetchFormat) -> ExitCode {
    let retriever = match TlsChainRetriever::from_config(&config.tls) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to build TLS client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let chain = retriever.retrieve(host, port).await;
    if chain.is_empty() {
        eprintln!("❌ No verified chain retrieved from {host}:{port}");
        return ExitCode::FAILURE;
    }

    match format {
        FetchFormat::Pem => {
            for entry in chain.entries() {
                print!("{entry}");
            }
            ExitCode::SUCCESS
        }
        FetchFormat::Json => match pin_record_json(host, port, &chain) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!(
                    "❌ Chain has {} certificate(s); cannot build a pinned record: {e}",
                    chain.len()
                );
                ExitCode::FAILURE
            }
        },
    }
}
