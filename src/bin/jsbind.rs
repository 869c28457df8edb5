use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};

use jsbind::cli::args::{CliArgs, OutputFormat};
use jsbind::cli::driver;
use jsbind::cli::reporter::Reporter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_DIAGNOSTICS_REPORTED: i32 = 1;

fn main() -> Result<()> {
    // JSBIND_LOG / JSBIND_LOG_FORMAT, see src/tracing_config.rs.
    jsbind::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let result = driver::run(&args)?;

    let output = match args.format {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(&result).context("failed to serialize the result")?;
            text.push('\n');
            text
        }
        OutputFormat::Text => {
            let color = args.pretty.unwrap_or_else(|| std::io::stdout().is_terminal());
            Reporter::new(color).render(&result)
        }
    };
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes()).context("failed to write output")?;
    stdout.flush().context("failed to write output")?;

    let code = if result.has_errors() {
        EXIT_DIAGNOSTICS_REPORTED
    } else {
        EXIT_SUCCESS
    };
    std::process::exit(code);
}
