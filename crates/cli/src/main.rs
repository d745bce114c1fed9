// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "warden")]
#[command(version, about = "Warden policy CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Policy validation and evaluation
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },
}

#[derive(Subcommand)]
enum PolicyCommands {
    /// Validate a policy JSON file
    Check {
        /// Path to the policy JSON file (single policy or array)
        file: String,
    },
    /// Evaluate an access request against a policy file
    Test {
        /// Path to the policy JSON file (single policy or array)
        file: String,

        /// Subject requesting access
        #[arg(short, long)]
        subject: String,

        /// Action to perform
        #[arg(short, long)]
        action: String,

        /// Resource the action targets
        #[arg(short, long, default_value = "")]
        resource: String,

        /// Context entries as key=value (value parsed as JSON, else string)
        #[arg(short, long = "context")]
        context: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Policy { command } => match command {
            PolicyCommands::Check { file } => {
                commands::policy::check(&file)?;
            }
            PolicyCommands::Test {
                file,
                subject,
                action,
                resource,
                context,
            } => {
                commands::policy::test(&file, &subject, &action, &resource, &context)?;
            }
        },
    }

    Ok(())
}
