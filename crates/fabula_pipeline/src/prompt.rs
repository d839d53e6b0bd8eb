//! Narrative prompt construction.

/// User prompt sent to the narrative service.
///
/// Asks for plain prose with one `Scene N:` heading per scene so the
/// segmenter finds explicit boundaries.
///
/// # Examples
///
/// ```
/// let prompt = fabula_pipeline::narrative_prompt("a rabbit and a spaceship", 3);
/// assert!(prompt.contains("\"a rabbit and a spaceship\""));
/// assert!(prompt.contains("exactly 3 scenes"));
/// ```
pub fn narrative_prompt(story_prompt: &str, max_scenes: usize) -> String {
    format!(
        "Create a story based on this prompt: \"{}\"\n\n\
         Write exactly {} scenes. Start each scene on a new line with \"Scene N:\" \
         (N counting from 1) and separate scenes with a blank line. \
         Each scene should be 2-3 sentences of narration. \
         Reply with the story text only.",
        story_prompt.trim(),
        max_scenes
    )
}
