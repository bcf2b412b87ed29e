//! Fallback synthesis and trivial-query handling

use tracing::debug;

use crate::parse::ITINERARY_DELIMITER;

/// Greetings that bypass planning entirely
const GREETINGS: &[&str] = &["hi", "hello", "hey"];

/// Canned reply for trivial queries. No planning is owed, so this is not a
/// degraded result.
pub const HELP_TEXT: &str = "Hi! I'm your travel planning assistant. \
Tell me your destination, how many days, and your budget \
(for example: \"Delhi to Jaipur, 2 days, budget\") and I'll put together an itinerary. \
You can then refine it: change the budget, extend the trip, or swap activities.";

/// Whether a (non-empty, pre-trimmed) query is too trivial to plan:
/// greeting-only or shorter than 4 characters.
pub fn is_trivial(query: &str) -> bool {
    let lowered = query.to_lowercase();
    let trivial = query.chars().count() < 4 || GREETINGS.contains(&lowered.as_str());
    debug!(query_len = query.len(), trivial, "is_trivial: classified");
    trivial
}

/// Build the always-valid quick-plan skeleton for a query whose planning
/// tiers all failed, with the failure diagnostic embedded as a
/// non-rendering trailer.
pub fn synthesize(query: &str, diagnostic: &str, max_diag_chars: usize) -> String {
    debug!(
        query_len = query.len(),
        diag_len = diagnostic.len(),
        "synthesize: building fallback plan"
    );

    let skeleton = format!(
        "# Quick Trip Plan\n\
         \n\
         The full planner couldn't answer in time, so here's a lightweight outline to get you started.\n\
         \n\
         **Your request:** {query}\n\
         \n\
         ## Suggested outline\n\
         - **Day 1** — arrive, settle in, and explore the area around your stay\n\
         - **Day 2** — pick one or two headline sights; book tickets ahead where you can\n\
         - **Meals** — favor busy local spots near the sights you choose\n\
         - **Getting around** — check a local transit day pass before defaulting to taxis\n\
         \n\
         Ask me again in a moment, or reply with your destination, dates, and budget and I'll plan it properly.\n"
    );

    format!("{}\n{}", skeleton, trailer(diagnostic, max_diag_chars))
}

/// Render the diagnostic as an HTML comment so operators can read failure
/// causes out of the response body without the UI showing them.
fn trailer(diagnostic: &str, max_chars: usize) -> String {
    let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    format!(
        "<!-- planner diagnostic [{}]: {} -->",
        stamp,
        sanitize(diagnostic, max_chars)
    )
}

/// Make a diagnostic safe to embed: drop any itinerary delimiter (so the
/// trailer can never be re-parsed as a payload boundary), break `--` runs
/// (which would terminate the HTML comment early), and keep only the last
/// `max_chars` characters.
fn sanitize(diagnostic: &str, max_chars: usize) -> String {
    let mut s = diagnostic.replace(ITINERARY_DELIMITER, "[delimiter]");
    while s.contains("--") {
        s = s.replace("--", "- -");
    }

    let count = s.chars().count();
    if count > max_chars {
        debug!(count, max_chars, "sanitize: truncating diagnostic");
        s = s.chars().skip(count - max_chars).collect();
    }
    s
}
