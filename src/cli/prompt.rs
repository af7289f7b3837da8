use crate::services::MissingEpisodes;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use dialoguer::MultiSelect;
use dialoguer::console::Term;

/// Open the native folder picker. Cancelling the dialog selects nothing.
pub fn pick_folders() -> Vec<Utf8PathBuf> {
    let Some(picked) = rfd::FileDialog::new()
        .set_title("Select media folders")
        .pick_folders()
    else {
        tracing::info!("Folder selection cancelled");
        return Vec::new();
    };

    picked
        .into_iter()
        .filter_map(|path| match Utf8PathBuf::from_path_buf(path) {
            Ok(path) => Some(path),
            Err(raw) => {
                tracing::warn!("Skipping non UTF-8 folder: {}", raw.display());
                None
            }
        })
        .collect()
}

/// Let the user choose which duplicate files to delete.
///
/// `assume_yes` selects every candidate. Without a terminal nothing is selected.
pub fn confirm_deletions(candidates: &[Utf8PathBuf], assume_yes: bool) -> Result<Vec<Utf8PathBuf>> {
    if assume_yes {
        return Ok(candidates.to_vec());
    }

    let picked = multi_select(
        "Select duplicate files to delete (space to toggle, enter to confirm)",
        &deletion_items(candidates),
    )?;

    Ok(picked.into_iter().map(|i| candidates[i].clone()).collect())
}

/// Let the user choose which missing episodes to request from Sonarr.
///
/// Items read `<Series> - S01E02 (Title)`. The result keeps the series grouping.
pub fn select_missing_episodes(missing: &MissingEpisodes, assume_yes: bool) -> Result<MissingEpisodes> {
    if assume_yes {
        return Ok(missing.clone());
    }

    let flattened = flatten_missing(missing);
    let items: Vec<String> = flattened
        .iter()
        .map(|(series, i)| format!("{} - {}", series, missing[series.as_str()][*i]))
        .collect();

    let picked = multi_select("Select missing episodes to request", &items)?;

    let mut selected = MissingEpisodes::new();
    for index in picked {
        let (series, i) = flattened[index];
        selected
            .entry(series.clone())
            .or_default()
            .push(missing[series.as_str()][i].clone());
    }
    Ok(selected)
}

fn deletion_items(candidates: &[Utf8PathBuf]) -> Vec<&str> {
    candidates.iter().map(|path| path.as_str()).collect()
}

/// `(series, index)` for every episode, in display order
fn flatten_missing(missing: &MissingEpisodes) -> Vec<(&String, usize)> {
    missing
        .iter()
        .flat_map(|(series, episodes)| (0..episodes.len()).map(move |i| (series, i)))
        .collect()
}

/// Print the missing episodes, grouped by series.
pub fn print_missing_episodes(missing: &MissingEpisodes) {
    for (series, episodes) in missing {
        println!("{}", series);
        for episode in episodes {
            println!("  {}", episode);
        }
    }
}

fn multi_select<T: ToString>(prompt: &str, items: &[T]) -> Result<Vec<usize>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let term = Term::stderr();
    if !term.is_term() {
        tracing::warn!("No terminal available for selection, pass --yes to accept all");
        return Ok(Vec::new());
    }

    let picked = MultiSelect::new()
        .with_prompt(prompt)
        .items(items)
        .interact_on_opt(&term)
        .context("Selection prompt failed")?;

    Ok(picked.unwrap_or_default())
}
