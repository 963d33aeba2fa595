// src/services/message_filter.rs
// DOCUMENTATION: Contact information filtering in chat messages
// PURPOSE: Prevent disintermediation before a booking is confirmed

/// Result of filtering one message
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub content: String,
    /// Categories that triggered: phone, email, messaging, social
    pub flags: Vec<&'static str>,
    pub was_filtered: bool,
}

const PHONE_NOTICE: &str = "[Numéro masqué - disponible après confirmation de la réservation]";
const EMAIL_NOTICE: &str = "[Email masqué - disponible après confirmation de la réservation]";
const MESSAGING_NOTICE: &str = "[Contact externe masqué - restez sur la plateforme Findam]";
const SOCIAL_NOTICE: &str = "[Réseau social masqué - utilisez la messagerie Findam]";

/// Off-platform messaging keywords
const MESSAGING_KEYWORDS: &[&str] = &[
    "whatsapp", "whats app", "watsap", "wa.me", "telegram", "viber", "messenger",
];

/// Social network keywords
const SOCIAL_KEYWORDS: &[&str] = &[
    "facebook", "fb.com", "fb.me", "instagram", "twitter", "tiktok", "linkedin",
];

/// Filter the content of an outgoing message
/// DOCUMENTATION: Once the two participants share a confirmed booking
/// the filter is bypassed entirely
pub fn filter_message_content(content: &str, booking_confirmed: bool) -> FilterOutcome {
    if booking_confirmed {
        return FilterOutcome {
            content: content.to_string(),
            flags: Vec::new(),
            was_filtered: false,
        };
    }

    let mut flags = Vec::new();

    let (text, phone_found) = mask_phone_numbers(content);
    if phone_found {
        flags.push("phone");
    }

    let (text, email_found) = mask_emails(&text);
    if email_found {
        flags.push("email");
    }

    let (text, messaging_found) = mask_keywords(&text, MESSAGING_KEYWORDS, MESSAGING_NOTICE);
    if messaging_found {
        flags.push("messaging");
    }

    let (text, social_found) = mask_keywords(&text, SOCIAL_KEYWORDS, SOCIAL_NOTICE);
    if social_found {
        flags.push("social");
    }

    FilterOutcome {
        was_filtered: !flags.is_empty(),
        content: text,
        flags,
    }
}

/// Mask runs of digits long enough to be a Cameroonian phone number
/// Digits may be separated by spaces, dots, dashes or a leading +
fn mask_phone_numbers(content: &str) -> (String, bool) {
    let chars: Vec<char> = content.chars().collect();
    let mut output = String::with_capacity(content.len());
    let mut found = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() || (c == '+' && chars.get(i + 1).map_or(false, |n| n.is_ascii_digit()))
        {
            // Scan forward through digits and inner separators
            let start = i;
            let mut end = i;
            let mut digit_count = 0;
            let mut j = i;
            while j < chars.len() {
                let cj = chars[j];
                if cj.is_ascii_digit() {
                    digit_count += 1;
                    end = j + 1;
                    j += 1;
                } else if (cj == ' ' || cj == '.' || cj == '-' || cj == '+')
                    && chars.get(j + 1).map_or(false, |n| n.is_ascii_digit())
                {
                    j += 1;
                } else {
                    break;
                }
            }

            // 9 digits covers local mobile numbers, 11+ the 237-prefixed form
            if digit_count >= 9 {
                output.push_str(PHONE_NOTICE);
                found = true;
            } else {
                output.extend(&chars[start..end]);
            }
            i = end;
        } else {
            output.push(c);
            i += 1;
        }
    }

    (output, found)
}

/// Mask email-looking tokens (local@domain.tld)
fn mask_emails(content: &str) -> (String, bool) {
    let mut found = false;
    let masked: Vec<String> = content
        .split_whitespace()
        .map(|token| {
            if looks_like_email(token) {
                found = true;
                EMAIL_NOTICE.to_string()
            } else {
                token.to_string()
            }
        })
        .collect();

    if found {
        (masked.join(" "), true)
    } else {
        (content.to_string(), false)
    }
}

fn looks_like_email(token: &str) -> bool {
    let token = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '@' && c != '.');
    let Some(at) = token.find('@') else {
        return false;
    };
    if at == 0 {
        return false;
    }
    let domain = &token[at + 1..];
    domain.contains('.') && domain.len() >= 3
}

/// Replace case-insensitive keyword hits with a notice
fn mask_keywords(content: &str, keywords: &[&str], notice: &str) -> (String, bool) {
    let mut text = content.to_string();
    let mut found = false;

    for keyword in keywords {
        while let Some((start, end)) = find_case_insensitive(&text, keyword) {
            text.replace_range(start..end, notice);
            found = true;
        }
    }

    (text, found)
}

/// Case-insensitive substring search returning a byte range on
/// character boundaries
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let chars: Vec<(usize, char)> = haystack.char_indices().collect();
    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.is_empty() || chars.len() < needle_chars.len() {
        return None;
    }

    for window_start in 0..=(chars.len() - needle_chars.len()) {
        let matches = chars[window_start..window_start + needle_chars.len()]
            .iter()
            .zip(&needle_chars)
            .all(|((_, hc), nc)| hc.to_lowercase().eq(nc.to_lowercase()));

        if matches {
            let start = chars[window_start].0;
            let end = chars
                .get(window_start + needle_chars.len())
                .map(|(idx, _)| *idx)
                .unwrap_or(haystack.len());
            return Some((start, end));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_message_passes_through() {
        let outcome = filter_message_content("Bonjour, le studio est-il libre en août ?", false);
        assert!(!outcome.was_filtered);
        assert_eq!(outcome.content, "Bonjour, le studio est-il libre en août ?");
    }

    #[test]
    fn test_local_phone_number_masked() {
        let outcome = filter_message_content("Appelle-moi au 650123456 ce soir", false);
        assert!(outcome.was_filtered);
        assert!(outcome.flags.contains(&"phone"));
        assert!(!outcome.content.contains("650123456"));
        assert!(outcome.content.contains("[Numéro masqué"));
    }

    #[test]
    fn test_prefixed_and_spaced_numbers_masked() {
        let outcome = filter_message_content("Mon numéro: +237 6 50 12 34 56", false);
        assert!(outcome.was_filtered);
        assert!(!outcome.content.contains("50 12 34"));

        let outcome = filter_message_content("237650123456 joignable le soir", false);
        assert!(outcome.was_filtered);
    }

    #[test]
    fn test_short_numbers_kept() {
        let outcome = filter_message_content("On sera 4, arrivée vers 18h30", false);
        assert!(!outcome.was_filtered);
        assert!(outcome.content.contains("18h30"));

        // Prices are short digit runs and must survive
        let outcome = filter_message_content("Le loyer est de 25000 par nuit", false);
        assert!(!outcome.was_filtered);
    }

    #[test]
    fn test_email_masked() {
        let outcome = filter_message_content("Écris-moi sur paul.essomba@gmail.com merci", false);
        assert!(outcome.was_filtered);
        assert!(outcome.flags.contains(&"email"));
        assert!(!outcome.content.contains("gmail.com"));
    }

    #[test]
    fn test_messaging_keywords_masked() {
        let outcome = filter_message_content("On continue sur WhatsApp ?", false);
        assert!(outcome.was_filtered);
        assert!(outcome.flags.contains(&"messaging"));
        assert!(!outcome.content.to_lowercase().contains("whatsapp"));
    }

    #[test]
    fn test_social_keywords_masked() {
        let outcome = filter_message_content("Retrouve-moi sur Facebook", false);
        assert!(outcome.was_filtered);
        assert!(outcome.flags.contains(&"social"));
    }

    #[test]
    fn test_confirmed_booking_bypasses_filter() {
        let outcome = filter_message_content("Mon numéro est 650123456, WhatsApp ok", true);
        assert!(!outcome.was_filtered);
        assert!(outcome.content.contains("650123456"));
    }

    #[test]
    fn test_multiple_categories_flagged() {
        let outcome =
            filter_message_content("650123456 ou paul@yahoo.fr ou telegram", false);
        assert!(outcome.flags.contains(&"phone"));
        assert!(outcome.flags.contains(&"email"));
        assert!(outcome.flags.contains(&"messaging"));
    }
}
