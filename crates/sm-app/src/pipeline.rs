// Lecture du flux d'entrée :
//   - `read_chunks`  : texte (un échantillon par ligne) → chunks de taille fixe
//   - `spawn_reader` : thread dédié, chunks livrés par canal flume borné

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread;

use anyhow::{Context, Result};
use flume::{Receiver, Sender};

/// Chunks en attente entre le lecteur et le traitement.
pub const CHANNEL_CAPACITY: usize = 4;

/// Parse `reader` line by line and send fixed-size chunks on `tx`.
///
/// Blank lines and lines starting with `#` are ignored; lines that do not
/// parse as a number are logged and skipped. The last chunk may be shorter.
/// Stops early without error if the receiver is gone.
///
/// Returns the number of samples read.
///
/// # Errors
/// I/O errors from `reader`.
pub fn read_chunks<R: BufRead>(
    reader: R,
    chunk_size: usize,
    tx: &Sender<Vec<f64>>,
) -> Result<usize> {
    let chunk_size = chunk_size.max(1);
    let mut chunk = Vec::with_capacity(chunk_size);
    let mut total = 0usize;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Erreur de lecture ligne {}", lineno + 1))?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => chunk.push(v),
            _ => {
                log::warn!("Ligne {} ignorée : '{text}'", lineno + 1);
                continue;
            }
        }
        total += 1;
        if chunk.len() == chunk_size {
            let full = std::mem::replace(&mut chunk, Vec::with_capacity(chunk_size));
            if tx.send(full).is_err() {
                return Ok(total);
            }
        }
    }
    if !chunk.is_empty() {
        let _ = tx.send(chunk);
    }
    log::info!("Lecteur : {total} échantillons lus");
    Ok(total)
}

/// Start the reader thread over `input` (stdin when `None`).
///
/// The file is opened before spawning so a missing input fails here.
///
/// # Errors
/// Input cannot be opened or the thread cannot be spawned.
pub fn spawn_reader(
    input: Option<&Path>,
    chunk_size: usize,
) -> Result<(thread::JoinHandle<Result<usize>>, Receiver<Vec<f64>>)> {
    let reader: Box<dyn BufRead + Send> = match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Impossible d'ouvrir {}", path.display()))?;
            log::info!("Lecture depuis {}", path.display());
            Box::new(BufReader::new(file))
        }
        None => {
            log::info!("Lecture depuis stdin");
            Box::new(BufReader::new(std::io::stdin()))
        }
    };

    let (tx, rx) = flume::bounded(CHANNEL_CAPACITY);
    let handle = thread::Builder::new()
        .name("sm-reader".to_string())
        .spawn(move || read_chunks(reader, chunk_size, &tx))
        .context("Impossible de spawner le thread lecteur")?;
    Ok((handle, rx))
}
