use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "wg-backend host provisioning")]
pub struct Args {
    /// Path to an alternative configuration file
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Sub-commands (provision runs when none is given)
    #[command(subcommand)]
    pub sub: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Full provisioning run (default if no sub-command)
    Provision,
    /// Check service status (Exit 0 = running, 1 = stopped)
    Status,
    /// Stop the registered service and remove its registration
    Unregister,
}
