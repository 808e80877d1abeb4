use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::{app::App, web};

mod commands;
mod errors;
mod validation;

pub use commands::*;
pub use errors::{CliError, CliResult};

#[derive(Parser, Debug)]
#[command(version, about = "Save links with their title, description and thumbnail", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save a link. Metadata is fetched from the page unless --no-meta.
    Add {
        /// a url, prompted for when missing
        #[clap(allow_hyphen_values = true)]
        url: Option<String>,

        /// Link title
        #[clap(short, long)]
        title: Option<String>,

        /// Link description
        #[clap(short, long)]
        description: Option<String>,

        /// Thumbnail image url
        #[clap(long)]
        thumbnail: Option<String>,

        /// Don't fetch meta at all
        #[clap(long, default_value = "false")]
        no_meta: bool,

        /// Don't ask anything
        #[clap(short = 'y', long, default_value = "false")]
        yes: bool,
    },

    /// List saved links, newest first
    List {
        /// Print cards as json
        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// Delete a saved link
    Delete {
        /// Link id, as printed by `list`
        id: String,

        /// Don't ask for confirmation
        #[clap(short = 'y', long, default_value = "false")]
        yes: bool,
    },

    /// Print the quick and the full metadata of a url
    Meta {
        url: String,
    },

    /// Serve the json api
    Daemon {},
}

pub fn run(command: Command, app: Arc<App>) -> anyhow::Result<()> {
    let result = match command {
        Command::Add {
            url,
            title,
            description,
            thumbnail,
            no_meta,
            yes,
        } => AddCommand {
            url,
            title,
            description,
            thumbnail,
            no_meta,
            yes,
        }
        .execute(&app),

        Command::List { json } => ListCommand { json }.execute(&app),

        Command::Delete { id, yes } => DeleteCommand { id, yes }.execute(&app),

        Command::Meta { url } => MetaCommand { url }.execute(&app),

        Command::Daemon {} => {
            let listen = app.config().listen.clone();
            return web::start_daemon(app, &listen);
        }
    };

    match result {
        Err(CliError::UserCancelled) => {
            eprintln!("cancelled");
            Ok(())
        }
        result => result.map_err(|e| anyhow::anyhow!(e)),
    }
}
