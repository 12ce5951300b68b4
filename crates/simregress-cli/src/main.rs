use clap::Parser;

mod cli;
mod console;

use cli::Cli;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let code = match cli::run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("fatal: {err:#}");
            2
        }
    };
    std::process::exit(code);
}
