// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! `smf-tool` dumps MIDI files and moves them in and out of their stored text
//! form.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ensnare_smf::{app_version, prelude::*};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(author, about, long_about = None, version = app_version())]
struct Args {
    /// JSON file of codec settings. Missing fields take their defaults.
    #[clap(short = 's', long, value_parser)]
    settings: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the events and warnings of a MIDI file
    Dump {
        /// MIDI file to read
        input: PathBuf,
    },
    /// Print a MIDI file in its text-safe stored form, as JSON
    Store {
        /// MIDI file to read
        input: PathBuf,
    },
    /// Turn stored JSON back into a MIDI file
    Restore {
        /// JSON file written by `store`
        input: PathBuf,
        /// MIDI file to write
        output: PathBuf,
    },
    /// Write the default four-note sequence as a MIDI file
    Default {
        /// MIDI file to write
        output: PathBuf,
    },
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<CodecSettings> {
    let Some(path) = path else {
        return Ok(CodecSettings::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("couldn't read settings from {}", path.display()))?;
    CodecSettings::from_json(&json)
        .with_context(|| format!("couldn't parse settings in {}", path.display()))
}

fn dump(settings: &CodecSettings, input: &Path) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("couldn't read {}", input.display()))?;
    let decoding = Decoder::new_with(settings).decode(&bytes);
    for note in &decoding.notes {
        println!("{note}");
        if let NotePayload::System(event) = &note.payload {
            if let Some(payload) = event.payload(&bytes) {
                println!("{:>14}{}", "", String::from_utf8_lossy(payload));
            }
        }
    }
    for warning in &decoding.warnings {
        eprintln!("warning: {warning}");
    }
    if let Some(error) = decoding.error {
        return Err(error).with_context(|| format!("couldn't decode {}", input.display()));
    }
    Ok(())
}

fn store(input: &Path) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("couldn't read {}", input.display()))?;
    println!("{}", serde_json::to_string_pretty(&StoredMidi::store(&bytes))?);
    Ok(())
}

fn restore(input: &Path, output: &Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("couldn't read {}", input.display()))?;
    let stored: StoredMidi = serde_json::from_str(&json)
        .with_context(|| format!("couldn't parse {}", input.display()))?;
    let bytes = stored.restore()?;
    std::fs::write(output, &bytes)
        .with_context(|| format!("couldn't write {}", output.display()))?;
    eprintln!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

fn write_default(settings: &CodecSettings, output: &Path) -> anyhow::Result<()> {
    let bytes = encode(&default_sequence(settings));
    std::fs::write(output, &bytes)
        .with_context(|| format!("couldn't write {}", output.display()))?;
    eprintln!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let settings = load_settings(args.settings.as_deref())?;

    match args.command {
        Command::Dump { input } => dump(&settings, &input),
        Command::Store { input } => store(&input),
        Command::Restore { input, output } => restore(&input, &output),
        Command::Default { output } => write_default(&settings, &output),
    }
}
