//! toolgate CLI - Main entry point

mod cli;
mod confirm;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use toolgate_foundation::{ConfirmationDelegate, FixedConfirmation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// toolgate - human-approved shell commands, file edits, and provider tools
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Approve every confirmation prompt (scripted use)
    #[arg(short, long, global = true)]
    yes: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a shell command after approval
    Run {
        /// Command line, passed to the configured shell
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Read a workspace file
    Read {
        path: String,
        /// Start line (1-based)
        #[arg(long)]
        offset: Option<usize>,
        /// Maximum number of lines
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write a workspace file after reviewing the diff
    Write {
        path: String,
        /// New content (read from stdin when omitted, requires --yes)
        #[arg(long)]
        content: Option<String>,
    },
    /// Replace one unique span in a workspace file
    Replace {
        path: String,
        /// Exact text to replace
        #[arg(long = "old")]
        old_span: String,
        /// Replacement text
        #[arg(long = "new")]
        new_span: String,
    },
    /// List builtin and provider tools
    Tools {
        /// Print full definitions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate and connect the providers in .toolgate/mcp.json
    Providers,
    /// Call a tool by name (use <provider>__<tool> for provider tools)
    Call {
        name: String,
        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
    /// Fetch a prompt from a provider
    Prompt {
        provider: String,
        name: String,
        /// Prompt arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
    /// Read a resource from a provider
    Resource { provider: String, uri: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging (stderr, so command output stays clean)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cwd = std::env::current_dir()?;
    let root = match args.root {
        Some(root) => cwd.join(root),
        None => cwd,
    };
    let root = std::fs::canonicalize(&root).unwrap_or(root);

    let delegate: Arc<dyn ConfirmationDelegate> = if args.yes {
        Arc::new(FixedConfirmation::approve())
    } else {
        Arc::new(confirm::TerminalConfirmation::new())
    };

    let session = cli::Session::open(root, delegate, args.yes)?;

    match args.command {
        Command::Run { command } => session.run(&command.join(" ")).await,
        Command::Read {
            path,
            offset,
            limit,
        } => session.read(&path, offset, limit).await,
        Command::Write { path, content } => session.write(&path, content).await,
        Command::Replace {
            path,
            old_span,
            new_span,
        } => session.replace(&path, &old_span, &new_span).await,
        Command::Tools { json } => session.tools(json).await,
        Command::Providers => session.providers().await,
        Command::Call { name, args } => session.call(&name, args.as_deref()).await,
        Command::Prompt {
            provider,
            name,
            args,
        } => session.prompt(&provider, &name, args.as_deref()).await,
        Command::Resource { provider, uri } => session.resource(&provider, &uri).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_run_keeps_command_words() {
        let args = Args::try_parse_from(["toolgate", "--yes", "run", "ls", "-la", "src"]).unwrap();
        assert!(args.yes);
        match args.command {
            Command::Run { command } => assert_eq!(command.join(" "), "ls -la src"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_replace_flags() {
        let args = Args::try_parse_from([
            "toolgate", "replace", "src/lib.rs", "--old", "fn a()", "--new", "fn b()",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Replace { ref old_span, ref new_span, .. } if old_span == "fn a()" && new_span == "fn b()"
        ));
    }
}
