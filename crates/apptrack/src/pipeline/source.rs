use std::io::BufRead;

use crate::error::PipelineError;
use crate::message::RawMessage;

/// One message per non-blank line. Bad lines come back as `PipelineError::Source`
/// with their 1-based line number so the batch can count them and move on.
pub fn read_json_lines<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<RawMessage, PipelineError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line_no = index + 1;
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(serde_json::from_str::<RawMessage>(&line).map_err(|e| {
                    PipelineError::Source {
                        line: line_no,
                        reason: e.to_string(),
                    }
                })),
                Err(e) => Some(Err(PipelineError::Source {
                    line: line_no,
                    reason: e.to_string(),
                })),
            }
        })
}
