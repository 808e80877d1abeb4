use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    app::App,
    cli::{
        errors::{CliError, CliResult},
        validation::*,
    },
    links::{LinkCreate, LinkId},
    metadata::Phase,
    preview::PreviewState,
};

const QUICK_WAIT: Duration = Duration::from_secs(1);

/// Save a new link, pre-filled from the page's metadata.
#[derive(Debug, Clone)]
pub struct AddCommand {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub no_meta: bool,
    pub yes: bool,
}

impl AddCommand {
    pub fn execute(self, app: &App) -> CliResult<()> {
        let url = match self.url.clone() {
            Some(url) => url,
            None => inquire::Text::new("URL:").prompt()?,
        };
        validate_url(&url)?;

        let mut create = LinkCreate {
            url: url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            thumbnail: self.thumbnail.clone(),
        };
        validate_link_create(&create)?;

        if !self.no_meta {
            let state = preview(app, &url);
            // explicit flags win over anything extracted
            create.title = create.title.or_else(|| Some(fit_extracted_title(state.title)));
            create.description = create
                .description
                .or_else(|| Some(fit_extracted_description(state.description)));
            create.thumbnail = create
                .thumbnail
                .or_else(|| fit_extracted_thumbnail(&url, state.thumbnail));
        }

        if !self.yes && self.title.is_none() {
            let initial = create.title.clone().unwrap_or_default();
            let title = inquire::Text::new("Title:")
                .with_initial_value(&initial)
                .with_help_message("leave empty to use the url")
                .prompt()?;
            validate_title(&title)?;
            create.title = Some(title);
        }

        let link = app.add(create)?;
        println!("{}", serde_json::to_string_pretty(&link)?);
        Ok(())
    }
}

fn preview(app: &App, url: &str) -> PreviewState {
    let mut session = app.preview_session_with(Duration::ZERO);
    session.input(url);

    let quick = session.wait_quick(QUICK_WAIT);
    if quick.phase < Phase::QuickReturned {
        return quick.clone();
    }
    eprintln!("{}", quick.title);

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("fetching metadata for {url}"));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let state = session.wait_settled(app.config().settle_timeout()).clone();
    spinner.finish_and_clear();

    if state.phase < Phase::Settled {
        log::warn!("metadata for {url} did not arrive in time, using what we have");
    }
    if let Some(err) = &state.error {
        eprintln!("note: {err}");
    }

    state
}

#[derive(Debug, Clone)]
pub struct ListCommand {
    pub json: bool,
}

impl ListCommand {
    pub fn execute(self, app: &App) -> CliResult<()> {
        let cards = app.cards();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&cards)?);
            return Ok(());
        }

        if cards.is_empty() {
            println!("no saved links");
            return Ok(());
        }

        for card in cards {
            let badge = if card.is_youtube { " [youtube]" } else { "" };
            println!("{}  {}{badge}", card.id, card.title);
            println!("    {} · {}", card.domain, card.age);
            if let Some(description) = &card.description {
                println!("    {description}");
            }
            println!("    {}", card.url);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DeleteCommand {
    pub id: String,
    pub yes: bool,
}

impl DeleteCommand {
    pub fn execute(self, app: &App) -> CliResult<()> {
        let id = LinkId::from(self.id.trim());
        let snapshot = app.links();
        let link = snapshot.get(&id).ok_or_else(|| CliError::NotFound {
            id: id.to_string(),
        })?;

        if !self.yes {
            let confirmed = inquire::prompt_confirmation(format!(
                "delete \"{}\" ({})? [y/n]",
                link.title, link.url
            ))?;
            if !confirmed {
                return Err(CliError::UserCancelled);
            }
        }

        let remaining = app.delete(&id)?;
        println!("deleted {id}, {} link(s) left", remaining.len());
        Ok(())
    }
}

/// Print both extraction phases for a URL without saving anything.
#[derive(Debug, Clone)]
pub struct MetaCommand {
    pub url: String,
}

impl MetaCommand {
    pub fn execute(self, app: &App) -> CliResult<()> {
        validate_url(&self.url)?;

        let pending = app.extractor().extract(&self.url);
        println!("{}", serde_json::to_string_pretty(&pending.quick)?);

        let full = pending.wait();
        println!("{}", serde_json::to_string_pretty(&full)?);
        Ok(())
    }
}
