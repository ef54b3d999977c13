//! SubRip (SRT) serialization

use super::SubtitleCue;

/// Format a millisecond offset as an SRT timecode (`HH:MM:SS,mmm`)
pub fn timecode(offset_ms: u64) -> String {
    let hours = offset_ms / 3_600_000;
    let minutes = (offset_ms / 60_000) % 60;
    let seconds = (offset_ms / 1_000) % 60;
    let millis = offset_ms % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Serialize cues as numbered SRT blocks separated by a blank line
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    cues.iter()
        .map(|cue| {
            format!(
                "{}\n{} --> {}\n{}\n",
                cue.sequence_id,
                timecode(cue.start_offset_ms),
                timecode(cue.end_offset_ms),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(sequence_id: u32, start: u64, end: u64, text: &str) -> SubtitleCue {
        SubtitleCue {
            sequence_id,
            start_offset_ms: start,
            end_offset_ms: end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_timecode_fields() {
        assert_eq!(timecode(0), "00:00:00,000");
        assert_eq!(timecode(2_500), "00:00:02,500");
        assert_eq!(timecode(3_723_004), "01:02:03,004");
        assert_eq!(timecode(100 * 3_600_000), "100:00:00,000");
    }

    #[test]
    fn test_render_two_blocks_in_order() {
        let srt = render_srt(&[cue(1, 0, 1000, "PASS a"), cue(2, 1000, 2500, "FAIL b")]);

        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,000\nPASS a\n\n2\n00:00:01,000 --> 00:00:02,500\nFAIL b\n"
        );
        assert_eq!(srt.split("\n\n").count(), 2);
    }

    #[test]
    fn test_render_empty_timeline() {
        assert_eq!(render_srt(&[]), "");
    }
}
