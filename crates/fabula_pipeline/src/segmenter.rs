//! Narrative segmentation.
//!
//! Boundaries are found in order of preference:
//! 1. scene headings (`Scene 2:`, `**Scene 2.**`, `Chapter 3 -`);
//! 2. separator lines (`***`, `* * *`, `---`, `###`);
//! 3. blank lines between paragraphs.
//!
//! The first kind yielding at least two chunks is used. A heading is a
//! keyword and number followed by a delimiter or the end of the line, so
//! prose such as `Part 1 of her plan` is not one. Headings are stripped
//! from the scene text; text before the first heading joins the first
//! scene.

use fabula_core::Scene;
use fabula_error::{SegmentationError, SegmentationErrorKind};
use regex::Regex;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*|__)?(?:scene|chapter|part)[ \t]+\d+(?:[ \t]*(?:\*\*|__)?[ \t]*[:.\-–](?:\*\*|__)?[ \t]*|[ \t]*(?:\*\*|__)?[ \t]*$)")
        .expect("Valid heading regex")
});

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:(?:\*[ \t]*){3,}|-{3,}|#{3,}|_{3,})[ \t]*$")
        .expect("Valid separator regex")
});

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n[ \t]*\n").expect("Valid blank line regex")
});

/// Splits narratives into ordered scenes.
///
/// Deterministic and free of side effects.
///
/// # Examples
///
/// ```
/// use fabula_pipeline::SceneSegmenter;
///
/// let narrative = "Scene 1: A rabbit finds a rocket.\n\nScene 2: The rabbit flies to the moon.";
/// let scenes = SceneSegmenter::segment(narrative, 6).unwrap();
///
/// assert_eq!(scenes.len(), 2);
/// assert_eq!(scenes[1].index, 1);
/// assert_eq!(scenes[1].text, "The rabbit flies to the moon.");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneSegmenter;

impl SceneSegmenter {
    /// Split `narrative` into at most `max_scenes` scenes.
    ///
    /// When more natural chunks exist than `max_scenes`, adjacent chunks are
    /// merged into `max_scenes` balanced, contiguous groups.
    ///
    /// # Errors
    ///
    /// Fails when the narrative is empty, when `max_scenes` is zero, or when
    /// fewer than two chunks are found.
    #[tracing::instrument(skip(narrative), fields(chars = narrative.len()))]
    pub fn segment(narrative: &str, max_scenes: usize) -> Result<Vec<Scene>, SegmentationError> {
        if max_scenes == 0 {
            return Err(SegmentationError::new(
                SegmentationErrorKind::InvalidSceneLimit(max_scenes),
            ));
        }
        let narrative = narrative.replace("\r\n", "\n");
        let narrative = narrative.trim();
        if narrative.is_empty() {
            return Err(SegmentationError::new(SegmentationErrorKind::EmptyNarrative));
        }

        let chunks = Self::natural_chunks(narrative);
        if chunks.len() < 2 {
            return Err(SegmentationError::new(
                SegmentationErrorKind::InsufficientBoundaries {
                    found: chunks.len(),
                },
            ));
        }

        let groups = merge_balanced(chunks, max_scenes);
        tracing::debug!(scenes = groups.len(), "Segmented narrative");
        Ok(groups
            .into_iter()
            .enumerate()
            .map(|(index, text)| Scene::new(index, text))
            .collect())
    }

    fn natural_chunks(narrative: &str) -> Vec<String> {
        let headed = heading_chunks(narrative);
        if headed.len() >= 2 {
            return headed;
        }

        let separated = split_on(&SEPARATOR, narrative);
        if separated.len() >= 2 {
            return separated;
        }

        let paragraphs = split_on(&BLANK_LINES, narrative);
        if paragraphs.len() >= 2 {
            return paragraphs;
        }
        tracing::debug!(headings = headed.len(), "No usable scene boundaries");
        paragraphs
    }
}

fn heading_chunks(narrative: &str) -> Vec<String> {
    let headings: Vec<_> = HEADING.find_iter(narrative).collect();
    let Some(first) = headings.first() else {
        return Vec::new();
    };
    let preamble = narrative[..first.start()].trim();
    let mut chunks = Vec::with_capacity(headings.len());
    for (i, heading) in headings.iter().enumerate() {
        let end = headings
            .get(i + 1)
            .map_or(narrative.len(), |next| next.start());
        let body = narrative[heading.end()..end].trim();
        let text = if i == 0 && !preamble.is_empty() {
            format!("{}\n\n{}", preamble, body)
        } else {
            body.to_string()
        };
        chunks.push(text);
    }
    clean(chunks)
}

/// Split on `boundary`, dropping a heading that opens any chunk.
fn split_on(boundary: &Regex, narrative: &str) -> Vec<String> {
    clean(
        boundary
            .split(narrative)
            .map(|chunk| strip_heading(chunk.trim()).to_string())
            .collect(),
    )
}

fn strip_heading(chunk: &str) -> &str {
    match HEADING.find(chunk) {
        Some(m) if m.start() == 0 => &chunk[m.end()..],
        _ => chunk,
    }
}

/// Trim chunks, collapse line-wrapped text, drop empties.
fn clean(chunks: Vec<String>) -> Vec<String> {
    chunks
        .into_iter()
        .map(|c| {
            c.split("\n\n")
                .map(|para| para.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|para| !para.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .filter(|c| !c.is_empty())
        .collect()
}

/// Merge `chunks` into at most `groups` contiguous groups of near-equal size.
fn merge_balanced(chunks: Vec<String>, groups: usize) -> Vec<String> {
    let n = chunks.len();
    if n <= groups {
        return chunks;
    }
    (0..groups)
        .map(|g| {
            let start = g * n / groups;
            let end = (g + 1) * n / groups;
            chunks[start..end].join("\n\n")
        })
        .collect()
}
