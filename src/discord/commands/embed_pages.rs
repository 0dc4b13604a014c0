// Fitting long listings into Discord embeds.
//
// Discord limits: 256 characters per title or field name, 1024 per field
// value, 25 fields per embed and 6000 characters per embed overall.

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

pub const NAME_LIMIT: usize = 256;
pub const FIELD_LIMIT: usize = 1024;
pub const FIELDS_PER_EMBED: usize = 25;
/// Field budget per embed; the rest of the 6000 goes to title, author and footer.
pub const EMBED_BUDGET: usize = 5500;

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn clamp_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clamped: String = text.chars().take(max.saturating_sub(1)).collect();
    clamped.push('…');
    clamped
}

/// Group lines into field values that stay under the field limit.
pub fn chunk_entries(entries: &[String]) -> Vec<Vec<String>> {
    let mut chunks = Vec::new();
    let mut current_chunk = Vec::new();
    let mut current_length = 0;

    for entry in entries {
        let entry_len = entry.chars().count();
        if current_length + entry_len + 1 > 1000 && !current_chunk.is_empty() {
            chunks.push(std::mem::take(&mut current_chunk));
            current_length = 0;
        }

        current_chunk.push(entry.clone());
        current_length += entry_len + 1; // +1 for newline
    }

    if !current_chunk.is_empty() {
        chunks.push(current_chunk);
    }

    chunks
}

/// Turn titled line lists into fields, splitting long ones into "(cont.)" fields.
pub fn fields_from_sections(sections: Vec<(String, Vec<String>)>) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for (title, lines) in sections {
        let title = clamp_text(&title, NAME_LIMIT - " (cont.)".len());
        let lines: Vec<String> = lines.iter().map(|line| clamp_text(line, 1000)).collect();
        for (i, chunk) in chunk_entries(&lines).iter().enumerate() {
            let name = if i == 0 {
                title.clone()
            } else {
                format!("{} (cont.)", title)
            };
            fields.push((name, chunk.join("\n")));
        }
    }
    fields
}

/// Split fields into pages that each fit in one embed.
pub fn paginate_fields(fields: Vec<(String, String)>) -> Vec<Vec<(String, String)>> {
    let mut pages = Vec::new();
    let mut page = Vec::new();
    let mut size = 0;

    for (name, value) in fields {
        let name = clamp_text(&name, NAME_LIMIT);
        let value = clamp_text(&value, FIELD_LIMIT);
        let len = name.chars().count() + value.chars().count();

        if !page.is_empty() && (page.len() == FIELDS_PER_EMBED || size + len > EMBED_BUDGET) {
            pages.push(std::mem::take(&mut page));
            size = 0;
        }
        size += len;
        page.push((name, value));
    }

    if !page.is_empty() {
        pages.push(page);
    }
    pages
}

/// Send `fields` as one or more copies of `base`, one message per page.
pub async fn send_paged(
    ctx: Context<'_>,
    base: serenity::CreateEmbed,
    fields: Vec<(String, String)>,
) -> Result<(), Error> {
    let pages = paginate_fields(fields);
    let count = pages.len();

    for (i, page) in pages.into_iter().enumerate() {
        let mut embed = base.clone();
        if count > 1 {
            embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
                "Page {}/{}",
                i + 1,
                count
            )));
        }
        for (name, value) in page {
            embed = embed.field(name, value, false);
        }
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_entries_respects_field_limit() {
        let entries: Vec<String> = (0..30).map(|i| format!("{:0>90}", i)).collect();
        let chunks = chunk_entries(&entries);

        assert!(chunks.len() > 1);
        assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), 30);
        for chunk in &chunks {
            assert!(chunk.join("\n").len() <= FIELD_LIMIT);
        }
    }

    #[test]
    fn test_chunk_entries_empty() {
        assert!(chunk_entries(&[]).is_empty());
    }

    #[test]
    fn test_clamp_text() {
        assert_eq!(clamp_text("short", 10), "short");
        let clamped = clamp_text(&"é".repeat(50), 10);
        assert_eq!(clamped.chars().count(), 10);
        assert!(clamped.ends_with('…'));
    }

    #[test]
    fn test_full_fields_are_spread_over_pages() {
        // Three classes with full gradebooks already pass 3000 characters.
        let fields: Vec<(String, String)> = (0..8)
            .map(|i| (format!("Class {}", i), "x".repeat(FIELD_LIMIT)))
            .collect();
        let pages = paginate_fields(fields);

        assert!(pages.len() > 1);
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), 8);
        for page in &pages {
            let size: usize = page
                .iter()
                .map(|(n, v)| n.chars().count() + v.chars().count())
                .sum();
            assert!(size <= EMBED_BUDGET);
            assert!(page.len() <= FIELDS_PER_EMBED);
        }
    }

    #[test]
    fn test_many_small_fields_respect_field_count() {
        let fields: Vec<(String, String)> = (0..30)
            .map(|i| (format!("C{}", i), "A".to_string()))
            .collect();
        let pages = paginate_fields(fields);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), FIELDS_PER_EMBED);
    }

    #[test]
    fn test_oversized_values_are_clamped() {
        let pages = paginate_fields(vec![("7A".to_string(), "x".repeat(5000))]);
        assert_eq!(pages[0][0].1.chars().count(), FIELD_LIMIT);
    }

    #[test]
    fn test_long_sections_continue_in_new_fields() {
        let lines: Vec<String> = (0..40).map(|i| format!("<@{}>: {}", i, "A, ".repeat(20))).collect();
        let fields = fields_from_sections(vec![("7A".to_string(), lines)]);

        assert!(fields.len() > 1);
        assert_eq!(fields[0].0, "7A");
        assert_eq!(fields[1].0, "7A (cont.)");
        for (_, value) in &fields {
            assert!(value.chars().count() <= FIELD_LIMIT);
        }
    }
}
