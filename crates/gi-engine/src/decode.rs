//! Loopback decoding: the reference engine "generates" by echoing the input
//! tokens back, within the session's token budget.

/// Tokens generated for `input` under a total budget of `max_tokens`.
///
/// Input tokens count against the budget, so a prompt that already fills
/// it produces nothing.
pub fn generate(input: &str, max_tokens: usize) -> Vec<&str> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let budget = max_tokens.saturating_sub(tokens.len());
    tokens.into_iter().take(budget).collect()
}

/// Render the full response text.
pub fn render(tokens: &[&str]) -> String {
    tokens.join(" ")
}

/// Split generated tokens into streaming chunks of `steps_per_sync` tokens.
///
/// Concatenating the chunks yields exactly `render(tokens)`.
pub fn render_chunks(tokens: &[&str], steps_per_sync: usize) -> Vec<String> {
    tokens
        .chunks(steps_per_sync.max(1))
        .enumerate()
        .map(|(i, chunk)| {
            let text = chunk.join(" ");
            if i == 0 {
                text
            } else {
                format!(" {}", text)
            }
        })
        .collect()
}
