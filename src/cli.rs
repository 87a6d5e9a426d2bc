use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("constant-contact-mcp")
        .about("Constant Contact MCP server (stdio JSON-RPC)")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
}

pub fn init_logging(level: Option<&str>) {
    // Respect explicit level, else default to info, allow env override via RUST_LOG.
    // env_logger writes to stderr, which keeps stdout free for JSON-RPC frames.
    let default = level.unwrap_or("info");
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let m = build_cli().get_matches_from(["constant-contact-mcp", "--log-level", "debug", "--version"]);
        assert_eq!(m.get_one::<String>("log-level").map(String::as_str), Some("debug"));
        assert!(m.get_flag("version"));
    }
}
