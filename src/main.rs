mod cli;

use anyhow::Context;
use constant_contact_mcp::{server, ApiClient, Config};
use log::error;

#[tokio::main(flavor = "current_thread")] // requests are served one at a time
async fn main() -> anyhow::Result<()> {
    let cmd = cli::build_cli();
    let matches = cmd.get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("constant-contact-mcp {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}; set it in the environment before starting the server", e);
            anyhow::bail!(e);
        }
    };
    let client = ApiClient::new(&cfg).context("building Constant Contact client")?;

    server::run_stdio_server(client).await?;
    Ok(())
}
