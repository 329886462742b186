// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use chrono::Utc;
use lesson_highlights_engine::models::{
    ElementId, GroupId, Highlight, HighlightCollection, HighlightColor, HighlightRange,
};

#[allow(dead_code)]
pub fn generate_lesson_markdown(paragraphs: usize) -> String {
    let base = "A paragraph with *some emphasis*, a `code span` and plenty of plain text to highlight.\n\n";
    base.repeat(paragraphs)
}

/// `per_paragraph` overlapping highlights in each of `paragraphs`, every
/// tenth paragraph joined into a group with its neighbour
#[allow(dead_code)]
pub fn generate_highlights(paragraphs: usize, per_paragraph: usize) -> HighlightCollection {
    let now = Utc::now();
    let mut highlights = Vec::new();
    for p in 0..paragraphs {
        let group_id = (p % 10 < 2).then_some(GroupId(uuid_for(p / 10)));
        for i in 0..per_paragraph {
            let range = HighlightRange {
                element_id: ElementId::from(p),
                start_offset: i * 12,
                end_offset: i * 12 + 18,
                text: String::new(),
            };
            let color = HighlightColor::ALL[i % HighlightColor::ALL.len()];
            highlights.push(Highlight::from_range(&range, color, group_id, now));
        }
    }
    HighlightCollection::from_highlights(highlights)
}

fn uuid_for(n: usize) -> uuid::Uuid {
    uuid::Uuid::from_u128(n as u128 + 1)
}
