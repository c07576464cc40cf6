//! Stdin as a scanning surface.
//!
//! USB barcode readers type the decoded QR text followed by Enter, so a
//! line-oriented reader over stdin works for both a reader and a hostess
//! pasting payloads by hand.

use luma_storefront::checkin::{Scanner, ScannerError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::output;

/// Words that end a scanning run.
const STOP_WORDS: [&str; 2] = ["q", "sair"];

/// Reads one payload per stdin line.
///
/// Lines typed while paused stay buffered and are handled after resume.
#[derive(Default)]
pub struct StdinScanner {
    lines: Option<Lines<BufReader<Stdin>>>,
    paused: bool,
}

impl StdinScanner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scanner for StdinScanner {
    async fn start(&mut self) -> Result<(), ScannerError> {
        self.lines = Some(BufReader::new(tokio::io::stdin()).lines());
        self.paused = false;
        output::line("Leitor ativo. Escaneie um código QR (`q` para sair).");
        Ok(())
    }

    async fn next_payload(&mut self) -> Result<Option<String>, ScannerError> {
        let lines = self
            .lines
            .as_mut()
            .ok_or_else(|| ScannerError::Failed("scanner not started".to_string()))?;

        loop {
            let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| ScannerError::Failed(e.to_string()))?
            else {
                return Ok(None);
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if STOP_WORDS.contains(&line.to_lowercase().as_str()) {
                return Ok(None);
            }
            return Ok(Some(line.to_string()));
        }
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            output::line("Pronto para o próximo código.");
        }
    }

    fn release(&mut self) {
        self.lines = None;
        self.paused = false;
        tracing::debug!("Stdin scanner released");
    }
}
