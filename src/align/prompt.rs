//! Instruction builder for the alignment service request.
//!
//! The aligner is a generative service: alongside the audio payload it
//! receives a plain-text instruction describing how the transcript must
//! be split and timed.  Keeping the instruction here (rather than inline
//! in the adapter) makes the contract testable and easy to tune.

/// Rules the aligner must follow when producing timed units.
const ALIGN_INSTRUCTION: &str = "\
You are an audio-to-text alignment engine.
Task: Split the transcript into natural phrase/sentence units that follow
the actual pauses in the speech, and time each unit against the audio.

Rules:
1. Split at real speech pauses, not merely at punctuation.
2. Merge interjections shorter than about 1 second into a neighboring
   unit. Never emit them as standalone units.
3. Preserve the transcript text EXACTLY. Do not add, omit, or alter any
   word.
4. Report startTime and endTime in seconds (decimal) for every unit.
5. Reply with ONLY a JSON object: {\"segments\": [{\"text\": ...,
   \"startTime\": ..., \"endTime\": ...}, ...]} — no explanation.";

/// Build the full instruction text sent with an alignment request.
pub fn build_instructions(transcript: &str) -> String {
    format!("{ALIGN_INSTRUCTION}\n\nTranscript:\n{transcript}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_embed_the_transcript() {
        let text = "Okay. I think we should go.";
        let prompt = build_instructions(text);
        assert!(prompt.contains(text));
        assert!(prompt.ends_with(text));
    }

    #[test]
    fn instructions_state_the_contract() {
        let prompt = build_instructions("x");
        assert!(prompt.contains("pauses"));
        assert!(prompt.contains("Merge interjections"));
        assert!(prompt.contains("EXACTLY"));
        assert!(prompt.contains("startTime"));
    }
}
