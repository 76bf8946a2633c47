mod decoder;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use karabeat_core::{export, feeder, project, sentence, Editor, KaraError};
use tracing_subscriber::EnvFilter;

use crate::decoder::SymphoniaDecoder;

fn main() -> karabeat_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::New {
            audio,
            lyrics,
            bpm,
            output,
        } => run_new(&audio, lyrics.as_deref(), bpm, output),
        Commands::Export { project, output } => run_export(&project, output),
        Commands::Info { project, json } => run_info(&project, json),
    }
}

fn run_new(
    audio: &Path,
    lyrics: Option<&Path>,
    bpm: Option<f64>,
    output: Option<PathBuf>,
) -> karabeat_core::Result<()> {
    let bytes = fs::read(audio)?;
    let mut editor = Editor::from_audio(bytes, &SymphoniaDecoder)?;

    if let Some(bpm) = bpm {
        let timing = editor.timing();
        editor.apply_timing(bpm, 0.0, timing.beats_per_line, timing.lyrics_per_beat)?;
    }
    if let Some(path) = lyrics {
        let text = fs::read_to_string(path)?;
        editor.set_waiting_lyrics(&text);
    }

    let output = output.unwrap_or_else(|| audio.with_extension(project::KMP_EXTENSION));
    fs::write(&output, project::encode(editor.document())?)?;
    editor.mark_saved();
    tracing::info!(
        ?output,
        slots = editor.document().lyrics.len(),
        "project created"
    );
    Ok(())
}

fn run_export(path: &Path, output: Option<PathBuf>) -> karabeat_core::Result<()> {
    let document = project::decode(&fs::read(path)?)?;
    let script = export::export(&document);

    let output = output.unwrap_or_else(|| path.with_extension("ass"));
    fs::write(&output, script)?;
    tracing::info!(?output, "karaoke script written");
    Ok(())
}

fn run_info(path: &Path, json: bool) -> karabeat_core::Result<()> {
    let document = project::decode(&fs::read(path)?)?;
    let editor = Editor::open(document, &SymphoniaDecoder)?;
    let document = editor.document();
    let timing = editor.timing();
    let sentences = sentence::sentences(document, 0.0);

    if json {
        let value = serde_json::json!({
            "bpm": document.track.bpm,
            "duration_seconds": editor.duration(),
            "grid_slots": document.lyrics.len(),
            "lyric_duration": timing.lyric_duration(),
            "voices": document.voices.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            "sentences": sentences.len(),
            "waiting_consumed": document.waiting_lyrics_position,
            "waiting_total": feeder::total_len(document),
        });
        let rendered =
            serde_json::to_string_pretty(&value).map_err(|e| KaraError::msg(e.to_string()))?;
        println!("{rendered}");
    } else {
        println!("bpm:            {}", document.track.bpm);
        println!("duration:       {:.2} s", editor.duration());
        println!(
            "grid:           {} slots of {:.3} s",
            document.lyrics.len(),
            timing.lyric_duration()
        );
        println!(
            "voices:         {}",
            document
                .voices
                .iter()
                .map(|v| v.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("sentences:      {}", sentences.len());
        println!(
            "waiting lyrics: {}/{} characters placed",
            document.waiting_lyrics_position,
            feeder::total_len(document)
        );
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Karaoke subtitle authoring toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a project around an audio file.
    New {
        /// Path to the audio file the lyrics will be timed against.
        audio: PathBuf,
        /// Optional lyric text to preload into the waiting queue.
        #[arg(short, long)]
        lyrics: Option<PathBuf>,
        /// Track tempo in beats per minute.
        #[arg(short, long)]
        bpm: Option<f64>,
        /// Output project path; defaults to the audio path with `.kmp`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a project's karaoke script.
    Export {
        /// Path to the project file.
        project: PathBuf,
        /// Output script path; defaults to the project path with `.ass`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarise a project file.
    Info {
        /// Path to the project file.
        project: PathBuf,
        /// Emit the summary as JSON.
        #[arg(long)]
        json: bool,
    },
}
