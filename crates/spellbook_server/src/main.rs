//! Headless API server entrypoint.

use spellbook_core::config::env_flag_enabled;
use spellbook_core::{open_store, Config, DEFAULT_PORT};
use spellbook_server::{resolve_bind_address, serve_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    check: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            "--check" => flags.check = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spellbook=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env()?;
    let store = open_store(&config)?;
    let live = store.count()?;
    tracing::info!(
        "Using {} store at {} ({} live spells)",
        store.backend(),
        config.data_dir.display(),
        live
    );

    if cli_flags.check {
        let trashed = store.list_trash()?.len();
        println!(
            "{} store OK: {} live, {} in trash ({})",
            store.backend(),
            live,
            trashed,
            config.data_dir.display()
        );
        return Ok(());
    }

    let allow_public = env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    let bind_override = std::env::var("BIND").ok();
    let bind_addr = resolve_bind_address(&config, allow_public, bind_override.as_deref());
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("Spellbook running at http://{}", actual_addr);

    let state = AppState::new(config, store);
    serve_router(listener, state, allow_public, shutdown_signal()).await?;
    tracing::info!("Spellbook server stopped");
    Ok(())
}

fn print_help() {
    println!("Spellbook Server\n");
    println!("Usage: spellbook-server [OPTIONS]\n");
    println!("Options:");
    println!("  --check           Open the configured store, print its counts, and exit");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  SPELLBOOK_STORE      Storage backend: json (default) or table");
    println!("  SPELLBOOK_DATA_DIR   Data directory (default: ~/.cache/spellbook)");
    println!("  PORT                 Server port (default: {})", DEFAULT_PORT);
    println!("  MAX_BODY_SIZE        Maximum request body in bytes (default: 64KiB)");
    println!("  CORS_ORIGINS         Comma-separated allowed origins (default: loopback on PORT)");
    println!("  ALLOW_PUBLIC_ACCESS  Allow CORS from any origin and non-loopback binds");
    println!(
        "  BIND                 Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_cli_flags, CliFlags};

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("spellbook-server")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn parse_cli_flags_rejects_unknown_and_positional_arguments() {
        let cases = [
            (args(&["--chek"]), "Unknown option"),
            (args(&["serve"]), "Unexpected positional argument"),
        ];

        for (args, expected_fragment) in cases {
            let err = parse_cli_flags(&args).expect_err("invalid args should be rejected");
            assert!(err.to_string().contains(expected_fragment));
        }
    }

    #[test]
    fn parse_cli_flags_accepts_supported_options() {
        let flags = parse_cli_flags(&args(&["--check"])).expect("known options should parse");
        assert_eq!(
            flags,
            CliFlags {
                help: false,
                check: true,
            }
        );
        assert_eq!(parse_cli_flags(&args(&[])).expect("no args"), CliFlags::default());
        assert!(parse_cli_flags(&args(&["-h"])).expect("short help").help);
    }
}
