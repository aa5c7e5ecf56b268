//! Turning generated text into speaker turns.
//!
//! Generated transcripts are loosely formatted: markdown emphasis around
//! labels, stage directions, a title line or a closing remark from the model.
//! [`parse_transcript`] keeps only labeled dialogue and refuses anything that
//! does not come out as Agent-first strict alternation.

use crate::labels::{Speaker, SpeakerLabels};
use thiserror::Error;

/// One contiguous utterance by a single speaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    /// A turn with trimmed text; `None` when nothing is left to say.
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Option<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(Self { speaker, text })
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Why a transcript violates turn alternation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("the first turn is spoken by the customer")]
    StartsWithCustomer,
    #[error("turn {index} has the same speaker as the turn before it")]
    ConsecutiveSpeaker { index: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Transcript is empty")]
    EmptyInput,

    #[error("No speaker labels recognized")]
    NoLabelsRecognized,

    #[error("Speaker labels found but every turn was empty")]
    NoTurns,

    #[error("Malformed transcript: {0}")]
    MalformedTranscript(MalformedReason),
}

impl ParseError {
    /// Stable identifier used in batch reports
    pub fn reason_code(&self) -> &'static str {
        match self {
            ParseError::EmptyInput => "empty_input",
            ParseError::NoLabelsRecognized => "no_labels_recognized",
            ParseError::NoTurns => "no_turns",
            ParseError::MalformedTranscript(MalformedReason::StartsWithCustomer) => {
                "starts_with_customer"
            }
            ParseError::MalformedTranscript(MalformedReason::ConsecutiveSpeaker { .. }) => {
                "consecutive_speaker"
            }
        }
    }
}

/// Parse raw generated text into alternating turns.
///
/// Lines before the first label are discarded. After that, an unlabeled line
/// only counts when the current label had no text of its own yet (a label on a
/// line by itself); otherwise it is narration and dropped. Directly adjacent
/// blocks of the same speaker merge into one turn joined by a single space.
/// A block left empty by stage-direction stripping is dropped but still
/// separates its neighbours, so it can surface as a consecutive-speaker error.
pub fn parse_transcript(raw: &str, labels: &SpeakerLabels) -> Result<Vec<Turn>, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let candidates = labels.candidates();
    let mut blocks: Vec<(Speaker, Vec<String>)> = Vec::new();
    let mut leading = 0usize;
    let mut narration = 0usize;

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((speaker, rest)) = match_label(line, &candidates) {
            let text = strip_stage_directions(rest);
            let parts = if text.is_empty() { vec![] } else { vec![text] };
            blocks.push((speaker, parts));
            continue;
        }

        match blocks.last_mut() {
            None => leading += 1,
            Some((_, parts)) if parts.is_empty() => {
                let text = strip_stage_directions(line);
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            Some(_) => narration += 1,
        }
    }

    if blocks.is_empty() {
        return Err(ParseError::NoLabelsRecognized);
    }
    if leading > 0 || narration > 0 {
        log::debug!(
            "Discarded {} leading and {} narration lines from transcript",
            leading,
            narration
        );
    }

    let mut turns: Vec<Turn> = Vec::new();
    let mut previous_block: Option<Speaker> = None;
    for (speaker, parts) in blocks {
        let adjacent = previous_block == Some(speaker);
        previous_block = Some(speaker);
        let Some(turn) = Turn::new(speaker, parts.join(" ")) else {
            continue;
        };
        match turns.last_mut() {
            Some(last) if adjacent && last.speaker == speaker => {
                last.text.push(' ');
                last.text.push_str(&turn.text);
            }
            _ => turns.push(turn),
        }
    }

    if turns.is_empty() {
        return Err(ParseError::NoTurns);
    }

    validate_alternation(&turns)?;
    Ok(turns)
}

/// Check that `turns` start with the agent and strictly alternate.
pub fn validate_alternation(turns: &[Turn]) -> Result<(), ParseError> {
    let Some(first) = turns.first() else {
        return Err(ParseError::NoTurns);
    };
    if first.speaker != Speaker::Agent {
        return Err(ParseError::MalformedTranscript(
            MalformedReason::StartsWithCustomer,
        ));
    }
    for (index, pair) in turns.windows(2).enumerate() {
        if pair[0].speaker == pair[1].speaker {
            return Err(ParseError::MalformedTranscript(
                MalformedReason::ConsecutiveSpeaker { index: index + 1 },
            ));
        }
    }
    Ok(())
}

/// One `Label: text` line per turn using the canonical labels.
pub fn render_transcript(turns: &[Turn], labels: &SpeakerLabels) -> String {
    let mut out = String::new();
    for turn in turns {
        out.push_str(labels.canonical(turn.speaker));
        out.push_str(": ");
        out.push_str(&turn.text);
        out.push('\n');
    }
    out
}

fn is_decoration(c: char) -> bool {
    matches!(c, '*' | '_' | '#' | '>' | '-') || c.is_whitespace()
}

fn is_emphasis(c: char) -> bool {
    matches!(c, '*' | '_') || c.is_whitespace()
}

/// Speaker and utterance remainder if `line` opens with a known label.
fn match_label<'a>(line: &'a str, candidates: &[(Speaker, &str)]) -> Option<(Speaker, &'a str)> {
    let body = line.trim_start_matches(is_decoration);
    for (speaker, label) in candidates {
        let Some(after) = strip_prefix_ignore_case(body, label) else {
            continue;
        };
        let after = skip_name_annotation(after.trim_start_matches(is_emphasis));
        let after = after.trim_start_matches(is_emphasis);
        if let Some(rest) = after.strip_prefix(':').or_else(|| after.strip_prefix('：')) {
            return Some((*speaker, rest.trim_start_matches(is_emphasis)));
        }
    }
    None
}

/// Skip a bracketed annotation between label and separator, e.g. `Agent (Maria):`.
fn skip_name_annotation(text: &str) -> &str {
    let close = if text.starts_with('(') {
        ')'
    } else if text.starts_with('[') {
        ']'
    } else {
        return text;
    };
    match text.find(close) {
        Some(end) => &text[end + 1..],
        None => text,
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let offset = chars.next().map(|(i, _)| i).unwrap_or(text.len());
    Some(&text[offset..])
}

/// Remove `[...]`, `(...)` and `*action*` spans and collapse whitespace.
fn strip_stage_directions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(['[', '(', '*']) {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);

        if tail.starts_with("**") {
            // Bold markers; the emphasized text is speech.
            rest = tail.trim_start_matches('*');
            continue;
        }

        let span = match tail.as_bytes()[0] {
            b'[' => tail[1..].find(']').map(|end| end + 2),
            b'(' => tail[1..].find(')').map(|end| end + 2),
            _ => action_span_len(tail, out.chars().last()),
        };
        match span {
            Some(len) => {
                out.push(' ');
                rest = &tail[len..];
            }
            None => {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    out.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, '*' | '_'))
        .trim()
        .to_string()
}

/// Byte length of a `*action*` span opening `tail`, if it is one.
///
/// Arithmetic like `5 * 3 * 2` or `2*3*4` is not an action: the content must
/// hug both asterisks, start and end with a non-digit, and the opening
/// asterisk must not be glued to a preceding word.
fn action_span_len(tail: &str, before: Option<char>) -> Option<usize> {
    let inner = tail.strip_prefix('*')?;
    let end = inner.find('*')?;
    let action = &inner[..end];
    let is_edge = |c: char| !c.is_whitespace() && !c.is_ascii_digit();
    let hugs = action.chars().next().is_some_and(is_edge)
        && action.chars().last().is_some_and(is_edge);
    let detached = before.is_none_or(|c| !c.is_alphanumeric());
    (hugs && detached).then_some(end + 2)
}
