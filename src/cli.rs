use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sheetbot")]
#[command(author, version, about = "Telegram front-end for a spreadsheet, a user store and a payment link", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling
    Run,

    /// Load the configuration and localization files, print a summary and exit
    CheckConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
