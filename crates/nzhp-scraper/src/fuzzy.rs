//! Case-insensitive fuzzy string similarity on a 0-100 scale.

/// Similarity of two strings: `100 * 2 * LCS / (len_a + len_b)` over
/// lowercased characters. Either string empty scores 0.
#[must_use]
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    char_ratio(&a, &b)
}

/// Best [`ratio`] of the shorter string against every equally long window of
/// the longer one.
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }

    let mut best = 0u8;
    for window in long.windows(short.len()) {
        best = best.max(char_ratio(&short, window));
        if best == 100 {
            break;
        }
    }
    best
}

fn char_ratio(a: &[char], b: &[char]) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let lcs = lcs_len(a, b);
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let score = ((200.0 * lcs as f64) / (a.len() + b.len()) as f64).round() as u8;
    score
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
