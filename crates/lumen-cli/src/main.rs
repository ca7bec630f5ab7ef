mod commands;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use colored::*;
use dotenv::dotenv;
use serde_json::Value;
use tracing::error;

use commands::{
    AlbumCommands, AssetCommands, Cli, Commands, JobCommands, ServerCommands, TagCommands,
};
use lumen_core::api::{AlbumApi, AssetApi, JobApi, ServerApi, TagApi};
use lumen_core::models::{JobCommand, JobName};
use lumen_core::upload::{HashLedger, UploadOptions, UploadReport, UploadStatus};
use lumen_core::{progress, AppConfig, Client, Error};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = logging::init_logger(args.verbose);

    let config = match lumen_core::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let command = match args.command {
        Some(ref command) => command,
        None => {
            let _ = Cli::command().print_long_help();
            return Ok(());
        }
    };

    if let Err(err) = run(&args, command, &config) {
        eprintln!("{} {}", "Error:".red().bold(), err);
        process::exit(1);
    }

    Ok(())
}

fn run(args: &Cli, command: &Commands, config: &AppConfig) -> Result<(), Error> {
    let client = build_client(args, config)?;

    match command {
        Commands::Server { command } => run_server(&client, command),
        Commands::Asset { command } => run_asset(&client, command, config),
        Commands::Album { command } => run_album(&client, command),
        Commands::Tag { command } => run_tag(&client, command),
        Commands::Job { command } => run_job(&client, command),
    }
}

fn build_client(args: &Cli, config: &AppConfig) -> Result<Client, Error> {
    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| config.endpoint.clone())
        .ok_or_else(|| {
            Error::Other("No endpoint configured; pass --endpoint or set LUMEN_ENDPOINT".to_string())
        })?;
    let api_key = args
        .api_key
        .clone()
        .or_else(|| config.api_key.clone())
        .ok_or_else(|| {
            Error::Other("No API key configured; pass --api-key or set LUMEN_API_KEY".to_string())
        })?;

    Client::builder(&endpoint, &api_key)
        .verify_ssl(!args.no_verify_ssl)
        .timeout(Duration::from_secs(args.timeout))
        .dry_run(args.dry_run)
        .build()
}

fn run_server(client: &Client, command: &ServerCommands) -> Result<(), Error> {
    let server = ServerApi::new(client);
    match command {
        ServerCommands::Ping => {
            if server.ping() {
                println!("{}", "Server is reachable".green());
            } else {
                return Err(Error::Other("Server did not answer the ping".to_string()));
            }
        }
        ServerCommands::Info => print_json(&server.about()?)?,
        ServerCommands::Stats => print_json(&server.statistics()?)?,
        ServerCommands::MediaTypes => {
            let mut entries: Vec<(String, String)> =
                server.media_types()?.into_iter().collect();
            entries.sort();
            for (extension, media_type) in entries {
                println!("{:12} {}", extension, media_type);
            }
        }
    }
    Ok(())
}

fn run_asset(client: &Client, command: &AssetCommands, config: &AppConfig) -> Result<(), Error> {
    let ledger = HashLedger::open(config.ledger_path.clone().map(PathBuf::from))?;
    let assets = AssetApi::new(client, ledger, config.hash_algorithm);

    match command {
        AssetCommands::Upload {
            path,
            album,
            ignore_dedup,
            no_progress,
            favorite,
            archived,
            sidecar,
            device_id,
        } => run_upload(
            client,
            &assets,
            config,
            path,
            album.as_deref(),
            UploadOptions {
                device_id: device_id.clone(),
                is_favorite: *favorite,
                is_archived: *archived,
                sidecar_path: sidecar.clone(),
                ignore_dedup: *ignore_dedup,
                show_progress: !*no_progress,
                ..UploadOptions::default()
            },
        ),
        AssetCommands::Info { id } => {
            let asset = assets.info(id)?;
            print_json(&serde_json::to_value(&asset)?)
        }
        AssetCommands::List { name } => {
            let listed = match name {
                Some(name) => assets.by_name(name)?,
                None => assets.all()?,
            };
            for asset in listed {
                println!(
                    "{}  {:5}  {}",
                    asset.id,
                    format!("{:?}", asset.asset_type).to_lowercase(),
                    asset.original_file_name.cyan()
                );
            }
            Ok(())
        }
        AssetCommands::Download { id, output } => {
            let asset = assets.info(id)?;
            let target = output.clone().unwrap_or_else(|| {
                PathBuf::from(if asset.original_file_name.is_empty() {
                    id.clone()
                } else {
                    asset.original_file_name.clone()
                })
            });
            let bytes = assets.download(id)?;
            fs::write(&target, &bytes)?;
            println!(
                "Saved {} ({} bytes)",
                target.display().to_string().green(),
                bytes.len()
            );
            Ok(())
        }
        AssetCommands::Update { id, fields } => {
            let fields: Value = serde_json::from_str(fields)?;
            let asset = assets.update(id, &fields)?;
            print_json(&serde_json::to_value(&asset)?)
        }
        AssetCommands::Delete { ids, force } => {
            assets.delete(ids, *force)?;
            println!("Deleted {} asset(s)", ids.len());
            Ok(())
        }
    }
}

fn run_upload(
    client: &Client,
    assets: &AssetApi,
    config: &AppConfig,
    path: &Path,
    album: Option<&str>,
    options: UploadOptions,
) -> Result<(), Error> {
    progress::set_max_workers(config.upload_workers);

    let report = assets.upload(path, &options);
    progress::clear_progress();
    let report = report?;

    print_upload_summary(&report);

    let album_name = album.map(str::to_string).or_else(|| {
        // Batch uploads default to an album named after the input
        match report {
            UploadReport::Many(_) => path
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned()),
            UploadReport::Single(_) => None,
        }
    });

    if let Some(album_name) = album_name {
        let ids: Vec<String> = report
            .outcomes()
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    UploadStatus::Created | UploadStatus::Replaced | UploadStatus::Duplicate
                )
            })
            .map(|o| o.id.clone())
            .filter(|id| !id.is_empty())
            .collect();

        if !ids.is_empty() {
            let albums = AlbumApi::new(client);
            let album = albums.find_or_create(&album_name)?;
            albums.add_assets(&album.id, &ids)?;
            println!(
                "Added {} asset(s) to album {}",
                ids.len(),
                album_name.cyan()
            );
        }
    }

    Ok(())
}

fn print_upload_summary(report: &UploadReport) {
    let created = report.count_with_status(&UploadStatus::Created);
    let replaced = report.count_with_status(&UploadStatus::Replaced);
    let duplicates = report.count_with_status(&UploadStatus::Duplicate);
    let skipped = report.count_with_status(&UploadStatus::Skipped);

    println!(
        "{} uploaded, {} replaced, {} server duplicates, {} skipped",
        created.to_string().green(),
        replaced.to_string().cyan(),
        duplicates.to_string().yellow(),
        skipped.to_string().yellow(),
    );
}

fn run_album(client: &Client, command: &AlbumCommands) -> Result<(), Error> {
    let albums = AlbumApi::new(client);
    match command {
        AlbumCommands::List => {
            for album in albums.all()? {
                println!(
                    "{}  {} ({} assets)",
                    album.id,
                    album.album_name.cyan(),
                    album.asset_count
                );
            }
        }
        AlbumCommands::Info { id } => {
            let album = albums.info(id, false)?;
            print_json(&serde_json::to_value(&album)?)?;
        }
        AlbumCommands::Create { name, description } => {
            let album = albums.create(name, description, &[])?;
            println!("Created album {} ({})", name.cyan(), album.id);
        }
        AlbumCommands::Delete { id } => {
            albums.delete(id)?;
            println!("Deleted album {}", id);
        }
        AlbumCommands::AddAssets { id, asset_ids } => {
            albums.add_assets(id, asset_ids)?;
            println!("Added {} asset(s) to album {}", asset_ids.len(), id);
        }
    }
    Ok(())
}

fn run_tag(client: &Client, command: &TagCommands) -> Result<(), Error> {
    let tags = TagApi::new(client);
    match command {
        TagCommands::List => {
            for tag in tags.all()? {
                println!("{}  {}", tag.id, tag.value.cyan());
            }
        }
        TagCommands::Upsert { names } => {
            for tag in tags.upsert(names)? {
                println!("{}  {}", tag.id, tag.value.cyan());
            }
        }
        TagCommands::TagAssets { tag_id, asset_ids } => {
            tags.tag_assets(tag_id, asset_ids)?;
            println!("Tagged {} asset(s)", asset_ids.len());
        }
    }
    Ok(())
}

fn run_job(client: &Client, command: &JobCommands) -> Result<(), Error> {
    let jobs = JobApi::new(client);
    match command {
        JobCommands::List => {
            let mut queues: Vec<_> = jobs.all()?.into_iter().collect();
            queues.sort_by(|a, b| a.0.cmp(&b.0));
            for (name, job) in queues {
                let state = if job.queue_status.is_paused {
                    "paused".yellow()
                } else if job.queue_status.is_active {
                    "active".green()
                } else {
                    "idle".normal()
                };
                println!(
                    "{:32} {}  {} active, {} waiting, {} failed",
                    name,
                    state,
                    job.job_counts.active,
                    job.job_counts.waiting,
                    job.job_counts.failed
                );
            }
        }
        JobCommands::Command {
            job_id,
            command,
            force,
        } => {
            let parsed: JobCommand = serde_json::from_value(Value::String(command.clone()))
                .map_err(|_| Error::Other(format!("Unknown job command: {}", command)))?;
            jobs.command(job_id, parsed, *force)?;
            println!("Sent {} to {}", command.cyan(), job_id);
        }
        JobCommands::Create { name } => {
            let parsed: JobName = serde_json::from_value(Value::String(name.clone()))
                .map_err(|_| Error::Other(format!("Unknown job name: {}", name)))?;
            jobs.create(parsed)?;
            println!("Created job {}", name.cyan());
        }
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
