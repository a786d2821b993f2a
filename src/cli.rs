//! Command-line front end.
//!
//! Batch tools (mask building, migration) and a few list operations that
//! run a session without the interactive viewer.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::data::MaskBuilder;
use crate::format::{BatchReport, FormatError};
use crate::migration::batch::migrate_dataset;
use crate::state::{Session, SessionError};

#[derive(Parser, Debug, Clone)]
#[command(name = "scene-annotator", version, about = "Annotate 3D scene meshes with object descriptions")]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Force debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// Build instance masks for every scene folder under a dataset root
    BuildMasks {
        dataset_dir: PathBuf,
    },
    /// Build the instance mask of one scene folder
    BuildMask {
        scene_dir: PathBuf,
    },
    /// Convert legacy annotation files of every scene folder
    Migrate {
        data_dir: PathBuf,
    },
    /// Print the annotation list of a scene
    List {
        scene_dir: PathBuf,
    },
    /// Replace the description of an annotation and save
    Edit {
        scene_dir: PathBuf,
        /// Position as printed by `list` (starting at 1)
        position: usize,
        description: String,
    },
    /// Delete an annotation and save
    Delete {
        scene_dir: PathBuf,
        /// Position as printed by `list` (starting at 1)
        position: usize,
    },
}

/// Errors reported by the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Some folders of a batch failed; the rest were processed
    #[error("{failed} of {total} folders failed")]
    BatchFailed { failed: usize, total: usize },

    /// An annotation file cannot be emptied, so the only record stays
    #[error("Cannot delete the last annotation from the command line; {path:?} is left unchanged")]
    LastAnnotation { path: PathBuf },
}

impl Opts {
    /// Load the config named by `--config`, or the default one.
    pub fn load_config(&self) -> Result<AppConfig, CliError> {
        match self.config.clone().or_else(AppConfig::default_path) {
            Some(path) => Ok(AppConfig::load(&path)?),
            None => Ok(AppConfig::new()),
        }
    }

    pub fn run(&self, config: &AppConfig) -> Result<(), CliError> {
        match &self.subcmd {
            SubCommand::BuildMasks { dataset_dir } => {
                let builder = MaskBuilder::new(config.scene.clone(), config.mask.overlap_policy);
                let report = builder.build_dataset(dataset_dir)?;
                finish_batch("Mask building", &report)
            }
            SubCommand::BuildMask { scene_dir } => {
                let builder = MaskBuilder::new(config.scene.clone(), config.mask.overlap_policy);
                let built = builder.build_scene(scene_dir)?;
                println!(
                    "{} ({} points, {} groups, {} conflicting points)",
                    built.path.display(),
                    built.mask.len(),
                    built.stats.groups,
                    built.stats.conflicting_points
                );
                Ok(())
            }
            SubCommand::Migrate { data_dir } => {
                let report = migrate_dataset(data_dir, &config.migration_options())?;
                finish_batch("Migration", &report)
            }
            SubCommand::List { scene_dir } => {
                let session = open_session(config, scene_dir)?;
                for label in session.list_labels() {
                    println!("{}", label);
                }
                Ok(())
            }
            SubCommand::Edit {
                scene_dir,
                position,
                description,
            } => {
                let mut session = open_session(config, scene_dir)?;
                let index = position_to_index(&session, *position)?;
                if session.edit(index, description)? {
                    session.save()?;
                    println!("{}", session.list_labels()[index]);
                } else {
                    log::info!("Description unchanged, nothing saved");
                }
                Ok(())
            }
            SubCommand::Delete {
                scene_dir,
                position,
            } => {
                let mut session = open_session(config, scene_dir)?;
                let index = position_to_index(&session, *position)?;
                if session.annotations().len() == 1 {
                    let path = session
                        .scene()
                        .map(|scene| scene.files().annotations_path())
                        .unwrap_or_else(|| scene_dir.clone());
                    return Err(CliError::LastAnnotation { path });
                }
                let removed = session.delete(index)?;
                session.save()?;
                println!("Deleted: {}", removed.full_text());
                Ok(())
            }
        }
    }
}

fn open_session(config: &AppConfig, scene_dir: &Path) -> Result<Session, SessionError> {
    let mut session = Session::from_config(config);
    session.load(scene_dir)?;
    Ok(session)
}

fn position_to_index(session: &Session, position: usize) -> Result<usize, SessionError> {
    let len = session.annotations().len();
    match position.checked_sub(1) {
        Some(index) if index < len => Ok(index),
        _ => Err(SessionError::IndexOutOfRange {
            index: position,
            len,
        }),
    }
}

fn finish_batch(what: &str, report: &BatchReport) -> Result<(), CliError> {
    for (folder, err) in &report.failed {
        eprintln!("{}: {}", folder.display(), err);
    }
    println!(
        "{}: {} processed, {} skipped, {} failed, {} files written",
        what,
        report.processed.len(),
        report.skipped.len(),
        report.failed.len(),
        report.files_written()
    );

    if report.has_failures() {
        return Err(CliError::BatchFailed {
            failed: report.failed.len(),
            total: report.processed.len() + report.skipped.len() + report.failed.len(),
        });
    }
    Ok(())
}
