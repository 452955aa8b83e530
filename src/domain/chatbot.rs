//! Canned-response tables for the portfolio chatbot.
//!
//! The bot is intentionally dumb: lowercase keyword matching against a fixed
//! category table, with a deterministic pick among a category's replies so
//! the same question always gets the same answer.

use once_cell::sync::Lazy;

pub struct Category {
    pub name: &'static str,
    keywords: &'static [&'static str],
    replies: &'static [&'static str],
}

static CATEGORIES: Lazy<Vec<Category>> = Lazy::new(|| {
    vec![
        Category {
            name: "greeting",
            keywords: &["hello", "hi", "hey", "good morning", "good evening"],
            replies: &[
                "Hi there! Ask me about projects, skills, or how to get in touch.",
                "Hello! I can tell you about the work showcased here.",
            ],
        },
        Category {
            name: "projects",
            keywords: &["project", "portfolio", "built", "work", "demo"],
            replies: &[
                "The projects page lists everything shipped recently, with source links where available.",
                "Have a look at the featured projects — each card links to the code and a live demo.",
            ],
        },
        Category {
            name: "skills",
            keywords: &["skill", "stack", "technology", "language", "framework"],
            replies: &[
                "The skills section breaks the stack down by category with honest proficiency levels.",
            ],
        },
        Category {
            name: "experience",
            keywords: &["experience", "career", "job", "education", "study", "journey"],
            replies: &[
                "The journey timeline covers roles and education in order — worth a scroll.",
            ],
        },
        Category {
            name: "contact",
            keywords: &["contact", "email", "reach", "hire", "available"],
            replies: &[
                "Use the contact form and you'll get a reply by email, usually within a day.",
            ],
        },
        Category {
            name: "resume",
            keywords: &["resume", "cv"],
            replies: &["A current CV is available on request via the contact form."],
        },
    ]
});

const FALLBACK_CATEGORY: &str = "fallback";
const FALLBACK_REPLIES: &[&str] = &[
    "I only know about this portfolio — try asking about projects, skills, or contact details.",
    "Not sure about that one. Projects, skills, experience, and contact info are my territory.",
];

/// Match a visitor message to a category and reply.
pub fn respond(message: &str) -> (&'static str, &'static str) {
    let needle = message.to_lowercase();

    for category in CATEGORIES.iter() {
        if category.keywords.iter().any(|kw| needle.contains(kw)) {
            return (category.name, pick(category.replies, &needle));
        }
    }

    (FALLBACK_CATEGORY, pick(FALLBACK_REPLIES, &needle))
}

fn pick(replies: &'static [&'static str], message: &str) -> &'static str {
    replies[message.len() % replies.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_known_topics() {
        assert_eq!(respond("Hi!").0, "greeting");
        assert_eq!(respond("what projects have you built?").0, "projects");
        assert_eq!(respond("Tell me about your tech STACK").0, "skills");
        assert_eq!(respond("can I see your resume?").0, "resume");
    }

    #[test]
    fn falls_back_for_unknown_topics() {
        let (category, reply) = respond("what's the weather like?");
        assert_eq!(category, "fallback");
        assert!(!reply.is_empty());
    }

    #[test]
    fn replies_are_deterministic() {
        assert_eq!(respond("hello there"), respond("hello there"));
    }
}
