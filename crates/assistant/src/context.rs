//! Context formatter: renders a user profile into a prompt fragment.
//!
//! Output is deterministic and always ordered profile, owned cards, then
//! spending patterns. A section with nothing to say is left out entirely,
//! and a context with nothing to say renders as the empty string.

use cardsense_core::context::{Amount, OwnedCard, SpendingPattern, UserContext, UserProfile};
use serde_json::Value;

const HEADER: &str = "=== USER CONTEXT ===";
const FOOTER: &str = "=== END USER CONTEXT ===";

/// Render `context` as a human-readable block for the prompt.
pub fn format_context(context: Option<&UserContext>) -> String {
    let Some(context) = context else {
        return String::new();
    };

    let sections: Vec<String> = [
        profile_section(context.profile.as_ref()),
        cards_section(&context.owned_cards),
        spending_section(&context.spending_patterns),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sections.is_empty() {
        return String::new();
    }

    format!("{HEADER}\n{}\n{FOOTER}", sections.join("\n\n"))
}

fn section(title: &str, lines: Vec<String>) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(format!("{title}:\n{}", lines.join("\n")))
    }
}

fn profile_section(profile: Option<&UserProfile>) -> Option<String> {
    let profile = profile?;
    let mut lines = Vec::new();

    if let Some(range) = present(&profile.spending_range) {
        lines.push(format!("- Monthly Spending: {range}"));
    }
    if let Some(goals) = joined(&profile.optimization_goals) {
        lines.push(format!("- Optimization Goals: {goals}"));
    }
    if let Some(categories) = joined(&profile.preferred_categories) {
        lines.push(format!("- Preferred Categories: {categories}"));
    }
    if let Some(note) = present(&profile.note) {
        lines.push(format!("- Additional Notes: {note}"));
    }

    section("User Profile", lines)
}

fn cards_section(cards: &[OwnedCard]) -> Option<String> {
    let mut lines = Vec::new();

    for card in cards {
        let Some(name) = present(&card.name) else {
            continue;
        };
        let primary = if card.is_primary { " (Primary)" } else { "" };
        lines.push(format!("- {name}{primary}"));

        if let Some(fee) = card.annual_fee.as_ref().and_then(Amount::rendered) {
            lines.push(format!("  Annual Fee: ₹{fee}"));
        }

        let labels = benefit_labels(&card.benefits);
        if !labels.is_empty() {
            lines.push(format!("  Key Benefits: {}", labels.join(", ")));
        }
    }

    section("Owned Cards", lines)
}

fn spending_section(patterns: &[SpendingPattern]) -> Option<String> {
    let lines = patterns
        .iter()
        .filter_map(|p| {
            let category = present(&p.category)?;
            let amount = p.amount.as_ref()?.rendered()?;
            let percentage = p.percentage.as_ref()?.rendered()?;
            Some(format!("- {category}: {amount} ({percentage}%)"))
        })
        .collect();

    section("Spending Patterns", lines)
}

/// Labels of benefits whose value is truthy, in key order.
fn benefit_labels(benefits: &serde_json::Map<String, Value>) -> Vec<String> {
    benefits
        .iter()
        .filter(|(_, value)| is_truthy(value))
        .map(|(key, _)| title_case(&key.replace('_', " ")))
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Uppercase the first letter of every word, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn joined(items: &[String]) -> Option<String> {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then(|| items.join(", "))
}
