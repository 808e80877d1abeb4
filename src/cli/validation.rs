use url::Url;

use crate::{
    cli::errors::{CliError, CliResult},
    links::LinkCreate,
    metadata::{defaults::default_thumbnail, normalize_url},
};

const MAX_TITLE_LEN: usize = 500;
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Scheme is optional, `https://` is assumed.
pub fn validate_url(url: &str) -> CliResult<()> {
    if url.trim().is_empty() {
        return Err(CliError::validation("url", "URL cannot be empty"));
    }

    match Url::parse(&normalize_url(url)) {
        Ok(parsed) if parsed.host_str().is_some() => Ok(()),
        Ok(_) => Err(CliError::validation("url", "URL must have a host")),
        Err(_) => Err(CliError::validation("url", "Invalid URL format")),
    }
}

pub fn validate_title(title: &str) -> CliResult<()> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CliError::validation(
            "title",
            format!("Title cannot exceed {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> CliResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CliError::validation(
            "description",
            format!("Description cannot exceed {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_thumbnail(thumbnail: &str) -> CliResult<()> {
    if thumbnail.trim().is_empty() {
        return Ok(());
    }
    match Url::parse(thumbnail.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(CliError::validation(
            "thumbnail",
            "Thumbnail must be an http(s) URL",
        )),
    }
}

pub fn validate_link_create(create: &LinkCreate) -> CliResult<()> {
    validate_url(&create.url)?;

    if let Some(title) = &create.title {
        validate_title(title)?;
    }

    if let Some(description) = &create.description {
        validate_description(description)?;
    }

    if let Some(thumbnail) = &create.thumbnail {
        validate_thumbnail(thumbnail)?;
    }

    Ok(())
}

fn truncate_chars(field: &str, value: String, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((end, _)) => {
            log::debug!("extracted {field} is longer than {max} characters, truncating");
            value[..end].to_string()
        }
        None => value,
    }
}

/// Page metadata is held to the same limits as typed input, but never
/// rejected: long text is cut and an unusable image falls back to the
/// default for the url.
pub fn fit_extracted_title(title: String) -> String {
    truncate_chars("title", title, MAX_TITLE_LEN)
}

pub fn fit_extracted_description(description: String) -> String {
    truncate_chars("description", description, MAX_DESCRIPTION_LEN)
}

pub fn fit_extracted_thumbnail(url: &str, thumbnail: String) -> Option<String> {
    if validate_thumbnail(&thumbnail).is_ok() {
        return Some(thumbnail);
    }
    log::warn!("ignoring extracted thumbnail for {url}, it is not an http(s) URL");
    default_thumbnail(&normalize_url(url))
}
