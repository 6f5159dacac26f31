//! # Haraj Publisher - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione degli input dell'utente
//! - Creazione della configurazione e avvio del publisher
//!
//! ## Flusso di esecuzione (post/story):
//! 1. Parsa i sottocomandi CLI (post, story, session)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica la sessione (token) e costruisce il client HTTP
//! 4. Sottomette in modo fire-and-forget e osserva lo slot pendente
//! 5. Rende il progress su terminale (indicatif) oppure come eventi JSON
//!
//! ## Esempio di utilizzo:
//! ```bash
//! haraj-publisher post "selling my bike" --media bike1.jpg bike2.jpg --promote gold
//! haraj-publisher story --media clip.mp4 --filter sepia --trim-start 2 --trim-end 9
//! haraj-publisher session login --token T --user-id 7 --user-name Sara
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use image::GenericImageView;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use haraj_publisher::{
    editor::{EditorSession, Filter, FrameGrabber, TrimRange},
    events::JsonMessage,
    media::MediaFiles,
    progress::IndicatorBar,
    Config, FileSessionStore, HttpApi, PendingContent, PendingStatus, PostDraft, PublishError,
    Publisher, SessionProfile, SessionStore,
};

fn validation_error(message: String) -> anyhow::Error {
    PublishError::Validation(message).into()
}

#[derive(Parser)]
#[command(name = "haraj-publisher")]
#[command(about = "Publish marketplace posts and stories with an optimistic pending indicator")]
struct Args {
    /// Path to a JSON config file (defaults used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the API base URL from the config
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Emit structured JSON events instead of the terminal indicator
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish a post, optionally with media attachments and paid promotion
    Post {
        /// Post body text
        text: String,

        /// Media files to attach
        #[arg(short, long, num_args = 1..)]
        media: Vec<PathBuf>,

        /// Attach every supported media file found in a directory (recursive)
        #[arg(long)]
        media_dir: Option<PathBuf>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Paid promotion tier applied after creation (best effort)
        #[arg(long, value_name = "TIER")]
        promote: Option<String>,
    },

    /// Publish a story (text, image or trimmed/filtered video)
    Story {
        /// Story text (caption, or the whole story when no media is given)
        #[arg(long)]
        text: Option<String>,

        /// Media file (image or video)
        #[arg(short, long)]
        media: Option<PathBuf>,

        /// Visual filter: none, mono, sepia, warm, cool, vivid
        #[arg(long)]
        filter: Option<String>,

        /// Trim start in seconds (video only)
        #[arg(long)]
        trim_start: Option<f64>,

        /// Trim end in seconds (video only)
        #[arg(long)]
        trim_end: Option<f64>,

        /// Text overlay placed at the center
        #[arg(long, value_name = "TEXT")]
        overlay_text: Option<String>,
    },

    /// Extract editor thumbnails from a video and report the sampling plan
    Thumbnails {
        /// Video file to sample
        video: PathBuf,
    },

    /// Manage the stored session identity
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Store a session profile for the configured API base URL
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        user_name: String,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Remove the stored session
    Logout,
    /// Print the stored session profile
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; JSON mode keeps stdout clean for the event stream
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else if args.json {
            tracing::Level::ERROR
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if let Some(base) = args.api_base {
        config.api_base_url = base;
    }
    config.json_output = args.json;
    config.validate()?;

    let session = Arc::new(FileSessionStore::new(&config.api_base_url).await?);

    match args.command {
        Command::Post {
            text,
            mut media,
            media_dir,
            category,
            city,
            phone,
            promote,
        } => {
            for file in &media {
                if !file.exists() {
                    return Err(validation_error(format!(
                        "Media file does not exist: {}",
                        file.display()
                    )));
                }
                if !MediaFiles::is_supported_format(file) {
                    return Err(validation_error(format!(
                        "Unsupported media format: {}",
                        file.display()
                    )));
                }
            }

            if let Some(dir) = &media_dir {
                if !dir.is_dir() {
                    return Err(validation_error(format!("Not a directory: {}", dir.display())));
                }
                media.extend(MediaFiles::collect_media_files(dir)?);
            }

            if !media.is_empty() {
                let total = MediaFiles::total_size(&media).await?;
                info!(
                    "Attaching {} file(s), {}",
                    media.len(),
                    MediaFiles::format_size(total)
                );
            }

            let draft = PostDraft {
                text,
                media_files: media,
                category,
                city,
                phone,
                promotion_tier: promote,
            };

            let publisher = build_publisher(&config, session)?;
            let rx = publisher.subscribe_posts();
            let task = publisher.submit_post(draft);

            let outcome = observe(&config, rx).await;
            task.wait().await;
            exit_status(outcome)
        }

        Command::Story {
            text,
            media,
            filter,
            trim_start,
            trim_end,
            overlay_text,
        } => {
            let payload = compose_story(text, media, filter, trim_start, trim_end, overlay_text)
                .await?;

            let publisher = build_publisher(&config, session)?;
            let rx = publisher.subscribe_stories();
            let task = publisher.submit_story(payload);

            let outcome = observe(&config, rx).await;
            task.wait().await;

            if config.json_output {
                JsonMessage::story_refresh(publisher.refresh_key()).emit();
            }
            exit_status(outcome)
        }

        Command::Thumbnails { video } => {
            if !MediaFiles::is_video(&video) {
                return Err(validation_error(format!("Not a video file: {}", video.display())));
            }
            FrameGrabber::check_dependencies().await?;
            let set = FrameGrabber::extract(&video).await?;

            println!("filter preview frame at {:.2}s", set.filter_preview.time);
            for thumb in &set.strip {
                println!(
                    "strip frame at {:6.2}s  {}x{}",
                    thumb.time,
                    thumb.image.width(),
                    thumb.image.height()
                );
            }
            Ok(())
        }

        Command::Session { action } => run_session_action(session.as_ref(), action),
    }
}

fn build_publisher(
    config: &Config,
    session: Arc<FileSessionStore>,
) -> Result<Publisher<HttpApi>> {
    let token = session.load()?.map(|profile| profile.token);
    if token.is_none() {
        info!("No stored session; publishing anonymously");
    }
    let api = HttpApi::new(config, token)?;
    Publisher::new(api, config.clone(), session)
}

/// Build the story payload through an editor session, mirroring the
/// interactive composition steps.
async fn compose_story(
    text: Option<String>,
    media: Option<PathBuf>,
    filter: Option<String>,
    trim_start: Option<f64>,
    trim_end: Option<f64>,
    overlay_text: Option<String>,
) -> Result<haraj_publisher::StoryPayload> {
    let mut editor = match &media {
        Some(file) => {
            if !file.exists() {
                return Err(validation_error(format!(
                    "Media file does not exist: {}",
                    file.display()
                )));
            }
            EditorSession::for_media(file.clone())
        }
        None => match &text {
            Some(t) => EditorSession::for_text(t.clone()),
            None => return Err(validation_error("A story needs text or a media file".into())),
        },
    };

    if let Some(name) = &filter {
        let parsed = Filter::from_name(name)
            .ok_or_else(|| validation_error(format!("Unknown filter: {}", name)))?;
        editor.set_filter(parsed);
    }

    if let Some(file) = &media {
        if MediaFiles::is_video(file) {
            FrameGrabber::check_dependencies().await?;
            let duration = FrameGrabber::probe_duration(file).await?;
            editor.media_loaded(duration);

            if trim_start.is_some() || trim_end.is_some() {
                if let Some(trim) = editor.trim() {
                    let range: &mut TrimRange = trim.range_mut();
                    if let Some(start) = trim_start {
                        range.set_start(start);
                    }
                    if let Some(end) = trim_end {
                        range.set_end(end);
                    }
                }
            }
        } else if trim_start.is_some() || trim_end.is_some() {
            return Err(validation_error("Trimming only applies to video stories".into()));
        }
    }

    if let Some(content) = overlay_text {
        editor.overlays.add_text(content, "#ffffff", 0.5, 0.5);
    }

    Ok(editor.into_story_payload())
}

/// Follow the pending slot to its end, rendering either the terminal
/// indicator or the JSON event stream.
async fn observe(
    config: &Config,
    rx: watch::Receiver<Option<PendingContent>>,
) -> Option<PendingStatus> {
    if config.json_output {
        mirror_json(rx).await
    } else {
        IndicatorBar::new().run(rx).await
    }
}

/// Mirror every slot snapshot as a JSON event until the item clears
async fn mirror_json(
    mut rx: watch::Receiver<Option<PendingContent>>,
) -> Option<PendingStatus> {
    let mut last_terminal = None;
    let mut started = false;

    loop {
        {
            let snapshot = rx.borrow_and_update();
            match snapshot.as_ref() {
                Some(content) => {
                    if !started {
                        JsonMessage::start(content).emit();
                        started = true;
                    }
                    JsonMessage::from_snapshot(content).emit();
                    if content.status.is_terminal() {
                        last_terminal = Some(content.status.clone());
                    }
                }
                None => {
                    if started {
                        break;
                    }
                }
            }
        }

        if rx.changed().await.is_err() {
            break;
        }
    }

    last_terminal
}

fn exit_status(outcome: Option<PendingStatus>) -> Result<()> {
    match outcome {
        Some(PendingStatus::Error(message)) => Err(anyhow::anyhow!("Publish failed: {}", message)),
        _ => Ok(()),
    }
}

fn run_session_action(store: &FileSessionStore, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::Login {
            token,
            user_id,
            user_name,
            avatar,
        } => {
            store.store(SessionProfile {
                token,
                user_id,
                user_name,
                user_avatar: avatar,
            })?;
            info!("Session stored at {}", store.path().display());
            Ok(())
        }
        SessionAction::Logout => {
            store.clear()?;
            info!("Session removed");
            Ok(())
        }
        SessionAction::Show => match store.load()? {
            Some(profile) => {
                println!("{}", serde_json::to_string_pretty(&profile)?);
                Ok(())
            }
            None => Err(PublishError::Session("No stored session".into()).into()),
        },
    }
}
