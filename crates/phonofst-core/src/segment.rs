// Segmentation of pronunciation strings into minimal symbols.

/// Splits a pronunciation string into its minimal symbols.
///
/// Implementations must return slices that concatenate back to the input.
pub trait Segmenter: Send + Sync {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Default segmenter: one symbol per base character.
///
/// Combining diacritics, the combining tie bar and spacing modifier letters
/// (aspiration, palatalization, length marks) attach to the preceding base
/// character instead of forming symbols of their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharSegmenter;

/// True for characters that modify the previous segment.
pub fn is_modifier(c: char) -> bool {
    let cp = c as u32;
    (0x0300..=0x036F).contains(&cp) // combining diacritical marks (incl. tie bars)
        || (0x02B0..=0x02FF).contains(&cp) // spacing modifier letters
        || (0x1DC0..=0x1DFF).contains(&cp) // combining diacritical marks supplement
}

impl Segmenter for CharSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut out: Vec<&'a str> = Vec::new();
        let mut start: Option<usize> = None;

        for (i, ch) in text.char_indices() {
            if is_modifier(ch) && start.is_some() {
                continue;
            }
            if let Some(s) = start {
                out.push(&text[s..i]);
            }
            start = Some(i);
        }
        if let Some(s) = start {
            out.push(&text[s..]);
        }
        out
    }
}
