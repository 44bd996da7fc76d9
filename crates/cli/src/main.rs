//! `guguma` -- command line driver for plant registration.
//!
//! Prepares a plant photo for upload, asks the recognition service for the
//! plant's name, and registers the plant with the backend.
//!
//! # Environment variables
//!
//! | Variable               | Required            | Default | Description                     |
//! |------------------------|---------------------|---------|---------------------------------|
//! | `API_PLANT_RECOGNIZE`  | recognize, register | --      | Recognition endpoint URL        |
//! | `API_PLANT_CREATE`     | recognize, register | --      | Plant creation endpoint URL     |
//! | `USER_UUID`            | register            | --      | Account id of the signed-in user |
//! | `REQUEST_TIMEOUT_SECS` | no                  | `30`    | Whole-request timeout           |
//! | `CONNECT_TIMEOUT_SECS` | no                  | `10`    | TCP connect timeout             |
//! | `MAX_UPLOAD_BYTES`     | no                  | `1048576` | Upload ceiling for the photo  |
//! | `UPLOAD_FILE_NAME`     | no                  | `compressed_image.jpg` | File name of the uploaded part |

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use guguma_client::{ClientConfig, CreateResult, PlantApi, RecognitionResult, SubmissionPipeline};
use guguma_core::draft::{
    parse_water_interval, validate_nickname, validate_plant_name, validate_user_id, PlantDraft,
};
use guguma_core::image_prep::{ImagePreparer, PrepareOptions, PreparedImage, DEFAULT_MAX_BYTES};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prepare plant photos and register plants.
#[derive(Parser, Debug)]
#[command(name = "guguma", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a photo under the upload ceiling and write it as JPEG
    Prepare {
        /// Source photo (JPEG, PNG or WebP)
        image: PathBuf,

        /// Output path (default: `<image>.upload.jpg`)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Upload ceiling in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
        max_bytes: usize,
    },

    /// Ask the recognition service for the plant's name
    Recognize {
        /// Source photo
        image: PathBuf,
    },

    /// Register a plant with the backend
    Register {
        /// Source photo
        image: PathBuf,

        /// Nickname for the plant
        #[arg(long)]
        nickname: String,

        /// Watering interval in days
        #[arg(long)]
        interval: String,

        /// Plant name; recognized from the photo when omitted
        #[arg(long)]
        name: Option<String>,

        /// Account id of the signed-in user
        #[arg(long, env = "USER_UUID")]
        user_uuid: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guguma_cli=info,guguma_client=info,guguma_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Args::parse().command {
        Command::Prepare {
            image,
            out,
            max_bytes,
        } => prepare(&image, out, max_bytes).await,
        Command::Recognize { image } => recognize(&image).await,
        Command::Register {
            image,
            nickname,
            interval,
            name,
            user_uuid,
        } => register(&image, nickname, &interval, name, user_uuid.unwrap_or_default()).await,
    }
}

async fn prepare(image: &Path, out: Option<PathBuf>, max_bytes: usize) -> Result<()> {
    let preparer = ImagePreparer::new(PrepareOptions::with_max_bytes(max_bytes))?;
    let source = image.to_path_buf();
    let prepared = tokio::task::spawn_blocking(move || preparer.prepare_file(&source))
        .await?
        .with_context(|| format!("Failed to prepare {}", image.display()))?;

    let out = out.unwrap_or_else(|| default_output_path(image));
    std::fs::write(&out, &prepared.bytes)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!("{}", describe(&prepared));
    println!("Wrote {}", out.display());
    Ok(())
}

async fn recognize(image: &Path) -> Result<()> {
    let pipeline = build_pipeline()?;
    let prepared = prepare_for_upload(&pipeline, image).await?;

    match pipeline.recognize(&prepared).await {
        RecognitionResult::Success { name } => {
            println!("{name}");
            Ok(())
        }
        RecognitionResult::Failure(failure) => bail!("Could not recognize the plant ({failure})"),
    }
}

async fn register(
    image: &Path,
    nickname: String,
    interval: &str,
    name: Option<String>,
    user_id: String,
) -> Result<()> {
    let water_interval_days = check_register_input(&nickname, interval, name.as_deref(), &user_id)?;

    let pipeline = build_pipeline()?;
    let prepared = prepare_for_upload(&pipeline, image).await?;

    let name = match name {
        Some(name) => name,
        None => match pipeline.recognize(&prepared).await {
            RecognitionResult::Success { name } => {
                tracing::info!(name = %name, "Using recognized plant name");
                name
            }
            RecognitionResult::Failure(failure) => bail!(
                "Could not recognize the plant ({failure}); pass --name to enter it manually"
            ),
        },
    };

    let draft = PlantDraft {
        image_uri: file_uri(image)?,
        compressed_image: Some(prepared),
        name,
        nickname,
        water_interval_days,
        user_id,
    };

    match pipeline.create_record(&draft).await {
        CreateResult::Success => {
            println!("Registered {} as \"{}\"", draft.name, draft.nickname);
            Ok(())
        }
        CreateResult::Failure(failure) if failure.is_retryable() => {
            bail!("Registration failed, try again ({failure})")
        }
        CreateResult::Failure(failure) => bail!("Registration failed ({failure})"),
    }
}

// ---- helpers ----

/// Check typed input before any upload; returns the parsed interval.
fn check_register_input(
    nickname: &str,
    interval: &str,
    name: Option<&str>,
    user_id: &str,
) -> Result<i64> {
    validate_user_id(user_id)?;
    validate_nickname(nickname)?;
    let water_interval_days = parse_water_interval(interval)?;
    if let Some(name) = name {
        validate_plant_name(name)?;
    }
    Ok(water_interval_days)
}

fn build_pipeline() -> Result<SubmissionPipeline> {
    let config = ClientConfig::from_env()?;
    tracing::debug!(
        recognize_url = %config.recognize_url,
        create_url = %config.create_url,
        timeout_secs = config.request_timeout_secs,
        "Loaded client configuration",
    );

    let api = PlantApi::new(&config)?;
    let preparer = ImagePreparer::new(config.prepare_options())?;
    Ok(SubmissionPipeline::new(api, preparer))
}

async fn prepare_for_upload(pipeline: &SubmissionPipeline, image: &Path) -> Result<PreparedImage> {
    let source = std::fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;
    let prepared = pipeline
        .prepare(source)
        .await
        .with_context(|| format!("Failed to prepare {}", image.display()))?;
    tracing::info!("{}", describe(&prepared));
    Ok(prepared)
}

fn describe(prepared: &PreparedImage) -> String {
    let budget = if prepared.within_budget {
        "within budget"
    } else {
        "over budget"
    };
    format!(
        "{}x{} JPEG, {} bytes at quality {} after {} pass(es), {budget}",
        prepared.width,
        prepared.height,
        prepared.len(),
        prepared.quality,
        prepared.iterations,
    )
}

/// `photo.png` -> `photo.upload.jpg`, next to the source.
fn default_output_path(image: &Path) -> PathBuf {
    image.with_extension("upload.jpg")
}

fn file_uri(image: &Path) -> Result<String> {
    let absolute = std::fs::canonicalize(image)
        .with_context(|| format!("Failed to resolve {}", image.display()))?;
    path_to_file_uri(&absolute)
}

/// Percent-encoded `file://` URL for an absolute path.
fn path_to_file_uri(path: &Path) -> Result<String> {
    reqwest::Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| anyhow!("{} is not an absolute path", path.display()))
}
