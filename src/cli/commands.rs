use crate::cli::progress::ProgressRenderer;
use crate::cli::{Cli, Commands, FolderArgs, MissingEpisodesArgs, OrganizeArgs, prompt, resolve_folders};
use crate::config::ConfigManager;
use crate::models::{AppConfig, MediaType, RunReport};
use crate::services::{
    DisabledShowDirectory, MediaInfoProbe, MediaOrganizer, MissingEpisodeAnalyzer, OrganizeOptions,
    ShowDirectory, SonarrClient, TvMazeClient,
};
use crate::state::StateManager;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Run the parsed command to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let config_manager = match &cli.config {
        Some(path) => ConfigManager::new(path),
        None => ConfigManager::beside_executable()?,
    };

    if let Commands::InitConfig { force } = cli.command {
        config_manager.write_template(force)?;
        println!("Wrote {}", config_manager.config_path());
        return Ok(());
    }

    let mut config = config_manager.load()?;
    config.apply_sonarr_overrides(cli.sonarr_url.as_deref(), cli.sonarr_api_key.as_deref());

    match cli.command {
        Commands::Organize(args) => organize(args, &config, cli.quiet).await,
        Commands::MissingEpisodes(args) => missing_episodes(args, &config, cli.quiet).await,
        Commands::InitConfig { .. } => Ok(()),
    }
}

async fn organize(args: OrganizeArgs, config: &AppConfig, quiet: bool) -> Result<()> {
    let folders = selected_folders(args.folders)?;
    let media_type = args.media_type;

    let options =
        OrganizeOptions::from_settings(media_type, folders.clone(), &config.organizer, args.dry_run);
    let probe = Arc::new(MediaInfoProbe::from_settings(&config.mediainfo));
    let shows: Arc<dyn ShowDirectory> = if media_type == MediaType::TvShows && config.tvmaze.enabled
    {
        Arc::new(TvMazeClient::from_settings(&config.tvmaze).context("Failed to create TVmaze client")?)
    } else {
        Arc::new(DisabledShowDirectory)
    };

    let state = StateManager::new();
    let organizer = MediaOrganizer::new(options, probe, shows, state.clone());
    let cancel = cancel_on_ctrl_c();

    let renderer = (!quiet).then(|| ProgressRenderer::spawn(&state));
    let result = organizer.run(&cancel).await;
    let records = state.read(|s| s.records.clone());
    if let Some(renderer) = renderer {
        renderer.finish(&state);
    }
    let summary = result?;

    println!("{}", summary);

    if !summary.deletion_candidates.is_empty() {
        println!(
            "{} identical duplicates found:",
            summary.deletion_candidates.len()
        );
        for candidate in &summary.deletion_candidates {
            println!("  {}", candidate);
        }

        let confirmed = prompt::confirm_deletions(&summary.deletion_candidates, args.yes)?;
        if confirmed.is_empty() {
            println!("No duplicates deleted");
        } else {
            let deleted = organizer.delete_files(&confirmed);
            println!("Deleted {} of {} duplicates", deleted, confirmed.len());
        }
    }

    if let Some(report_path) = args.report {
        let report = RunReport {
            media_type,
            dry_run: args.dry_run,
            folders,
            summary,
            files: records,
        };
        report.write_yaml(&report_path)?;
        println!("Report written to {}", report_path);
    }

    Ok(())
}

async fn missing_episodes(args: MissingEpisodesArgs, config: &AppConfig, quiet: bool) -> Result<()> {
    let folders = selected_folders(args.folders)?;

    if !config.sonarr.has_api_key() {
        tracing::warn!("No Sonarr API key configured, Sonarr requests will fail");
    }
    let client = SonarrClient::from_settings(&config.sonarr).context("Invalid Sonarr settings")?;

    let state = StateManager::new();
    let analyzer = MissingEpisodeAnalyzer::new(Arc::new(client), state.clone());
    let cancel = cancel_on_ctrl_c();

    let renderer = (!quiet).then(|| ProgressRenderer::spawn(&state));
    let result = analyzer.analyze(&folders, &cancel).await;
    if let Some(renderer) = renderer {
        renderer.finish(&state);
    }
    let missing = result?;

    if missing.is_empty() {
        println!("No missing episodes found");
        return Ok(());
    }

    prompt::print_missing_episodes(&missing);
    let selected = prompt::select_missing_episodes(&missing, args.yes)?;
    if selected.is_empty() {
        println!("Nothing requested from Sonarr");
        return Ok(());
    }

    let submission = analyzer.submit(&selected).await;
    println!("Requested {} episodes from Sonarr", submission.submitted);
    if !submission.failed_series.is_empty() {
        println!("Failed for: {}", submission.failed_series.join(", "));
    }

    Ok(())
}

fn selected_folders(args: FolderArgs) -> Result<Vec<Utf8PathBuf>> {
    let mut folders = args.folders;
    if args.pick {
        folders.extend(prompt::pick_folders());
    }
    resolve_folders(folders)
}

/// Cancellation flag flipped by the first Ctrl-C. A second Ctrl-C exits immediately.
fn cancel_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Cancelling after the current file, press Ctrl-C again to quit now");
        let _ = tx.send(true);

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted");
            std::process::exit(130);
        }
    });

    rx
}
