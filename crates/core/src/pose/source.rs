use std::{collections::VecDeque, io::BufRead};

use crate::{PoseFrame, Result};

/// Narrow capability boundary for the external pose detector: hand out the
/// next frame, or `None` once the stream has ended. The analysis core never
/// sees how frames are produced.
pub trait PoseSource {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>>;
}

/// Reads one JSON-encoded [`PoseFrame`] per line. Blank lines are skipped.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    line_number: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
        }
    }

    /// Number of lines consumed so far, including blank ones.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> PoseSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_str(trimmed)?));
        }
    }
}

/// In-memory frame queue, handy for demos and deterministic tests.
#[derive(Debug, Default, Clone)]
pub struct ReplaySource {
    frames: VecDeque<PoseFrame>,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = PoseFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PoseSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        Ok(self.frames.pop_front())
    }
}
