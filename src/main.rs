/// maskpaint entry point for native builds
#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> std::process::ExitCode {
    use clap::Parser;
    use maskpaint::cli::{self, CliArgs, Command};

    let args = CliArgs::parse();

    // The service's configured level applies unless RUST_LOG says otherwise
    let level = match &args.command {
        Command::Serve(serve) => cli::load_config(serve)
            .map(|config| config.log_level.to_level_filter())
            .unwrap_or(log::LevelFilter::Info),
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    cli::run(args).await
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
