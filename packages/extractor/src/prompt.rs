//! System and per-chunk prompts for section extraction.

use crate::extraction::ChunkRequest;

const SYSTEM_EXTRACTION: &str = include_str!("../prompts/system_extraction.txt");

/// Build the system prompt for section extraction.
pub fn build_system_prompt() -> &'static str {
    SYSTEM_EXTRACTION
}

/// Build the user prompt for one chunk.
pub fn build_chunk_prompt(request: &ChunkRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Document: {}\n", request.filename));
    prompt.push_str(&format!(
        "- Chunk {} of {}\n",
        request.chunk_index + 1,
        request.total_chunks
    ));
    if request.chunk_index > 0 {
        prompt.push_str(
            "- This chunk overlaps the end of the previous one; sections may repeat.\n",
        );
    }
    if request.chunk_index + 1 < request.total_chunks {
        prompt.push_str("- The last section may continue in the next chunk.\n");
    }
    prompt.push('\n');

    prompt.push_str("# Text\n\n");
    prompt.push_str(&request.chunk_text);
    prompt.push_str("\n\n");

    if request.chunk_index == 0 {
        prompt.push_str(
            "This is the start of the document: include \"lawMetadata\" with the \
             law's title, short title, description and effective date.\n",
        );
    }

    prompt.push_str(
        "Extract every section in the text above. \
         Return ONLY the JSON object. No markdown fences or explanations.",
    );

    prompt
}
