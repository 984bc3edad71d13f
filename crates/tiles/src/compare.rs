const WORD: usize = size_of::<usize>();
/// Below this length the byte loop wins.
const MIN_WORD_SCAN: usize = WORD * 4;

/// Offset of the first byte where `old` and `live` differ.
///
/// Identically aligned inputs are scanned a native word at a time, skipping
/// the longest run of equal words before resolving the exact byte inside the
/// first unequal word. Anything else falls back to a byte loop.
pub fn compare_aligned_chunks(old: &[u8], live: &[u8]) -> Option<usize> {
    let len = old.len().min(live.len());
    let (old, live) = (&old[..len], &live[..len]);

    let head = old.as_ptr().align_offset(WORD);
    if len < MIN_WORD_SCAN || head != live.as_ptr().align_offset(WORD) || head >= len {
        return first_difference_bytewise(old, live, 0);
    }

    if let Some(found) = first_difference_bytewise(&old[..head], &live[..head], 0) {
        return Some(found);
    }

    let body = (len - head) / WORD * WORD;
    let words = old[head..head + body]
        .chunks_exact(WORD)
        .zip(live[head..head + body].chunks_exact(WORD));
    for (index, (old_word, live_word)) in words.enumerate() {
        let delta = load_word(old_word) ^ load_word(live_word);
        if delta != 0 {
            return Some(head + index * WORD + (delta.trailing_zeros() / 8) as usize);
        }
    }

    let tail = head + body;
    first_difference_bytewise(&old[tail..], &live[tail..], tail)
}

fn load_word(bytes: &[u8]) -> usize {
    let mut word = [0u8; WORD];
    word.copy_from_slice(bytes);
    usize::from_le_bytes(word)
}

fn first_difference_bytewise(old: &[u8], live: &[u8], base: usize) -> Option<usize> {
    old.iter()
        .zip(live)
        .position(|(a, b)| a != b)
        .map(|offset| base + offset)
}
