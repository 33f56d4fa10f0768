// src/resume.rs
//! Resume context builder - bounded resume representation for prompts

use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::config::{ResumeConfig, ResumeStrategy};
use crate::types::ResumeContext;
use crate::utils::{char_len, collapse_whitespace, truncate_chars};

const MAX_ACHIEVEMENTS: usize = 5;
const MAX_PER_VERB_CATEGORY: usize = 3;

/// Achievement verbs grouped by category; a line counts when it starts with one of them
const ACHIEVEMENT_VERBS: [(&str, &[&str]); 4] = [
    ("results", &["Achieved", "Exceeded", "Delivered", "Won"]),
    ("leadership", &["Led", "Managed", "Directed", "Spearheaded", "Mentored"]),
    ("improvement", &["Improved", "Increased", "Reduced", "Optimized", "Streamlined"]),
    ("creation", &["Built", "Developed", "Designed", "Launched", "Created"]),
];

const SKILL_STOPWORDS: [&str; 4] = ["and", "or", "with", "the"];

pub struct ResumeContextBuilder {
    config: ResumeConfig,
    summary_re: Option<Regex>,
    skills_re: Option<Regex>,
}

impl ResumeContextBuilder {
    pub fn new(config: ResumeConfig) -> Self {
        // Label on its own line or followed by inline text, up to the next blank line
        let summary_re = Regex::new(
            r"(?im)^[ \t]*(?:professional[ \t]+summary|career[ \t]+objective)[ \t]*:?[ \t]*\n?((?:[^\n]*\S[^\n]*\n?)+)",
        );
        let skills_re = Regex::new(
            r"(?im)^[ \t]*(?:technical[ \t]+skills|core[ \t]+competencies|key[ \t]+skills|skills)[ \t]*:?[ \t]*\n?((?:[^\n]*\S[^\n]*\n?)+)",
        );

        if summary_re.is_err() || skills_re.is_err() {
            warn!("Resume patterns failed to compile, structured strategy degrades to raw text");
        }

        Self {
            config,
            summary_re: summary_re.ok(),
            skills_re: skills_re.ok(),
        }
    }

    pub fn build(&self, resume_text: &str) -> ResumeContext {
        match self.config.strategy {
            ResumeStrategy::Raw => ResumeContext {
                raw_text: truncate_chars(resume_text, self.config.max_chars),
                source_chars: char_len(resume_text),
                ..Default::default()
            },
            ResumeStrategy::Structured => self.build_structured(resume_text),
        }
    }

    fn build_structured(&self, resume_text: &str) -> ResumeContext {
        let summary = self
            .extract_summary(resume_text)
            .or_else(|| {
                let head = collapse_whitespace(&truncate_chars(resume_text, self.config.max_chars));
                (!head.is_empty()).then_some(head)
            });
        let achievements = extract_achievements(resume_text);
        let skills = self.extract_skills(resume_text);

        debug!(
            "Structured resume: summary={}, achievements={}, skills={}",
            summary.is_some(),
            achievements.len(),
            skills.len()
        );

        ResumeContext {
            raw_text: truncate_chars(resume_text, self.config.max_chars),
            summary,
            achievements,
            skills,
            source_chars: char_len(resume_text),
        }
    }

    fn extract_summary(&self, text: &str) -> Option<String> {
        let captures = self.summary_re.as_ref()?.captures(text)?;
        let body = collapse_whitespace(captures.get(1)?.as_str());
        if body.is_empty() {
            return None;
        }
        Some(truncate_chars(&body, self.config.max_chars))
    }

    fn extract_skills(&self, text: &str) -> BTreeSet<String> {
        let Some(re) = self.skills_re.as_ref() else {
            return BTreeSet::new();
        };

        re.captures_iter(text)
            .filter_map(|c| c.get(1))
            .flat_map(|m| tokenize_skills(m.as_str()))
            .collect()
    }
}

fn extract_achievements(text: &str) -> Vec<String> {
    let mut per_category: HashMap<&str, usize> = HashMap::new();
    let mut achievements = Vec::new();

    for line in text.lines() {
        if achievements.len() >= MAX_ACHIEVEMENTS {
            break;
        }
        let line = line
            .trim()
            .trim_start_matches(['-', '*', '•', '–', ' '])
            .trim();
        let Some(first_word) = line.split_whitespace().next() else {
            continue;
        };
        let first_word = first_word.trim_end_matches([',', ':', ';']);

        let category = ACHIEVEMENT_VERBS.iter().find_map(|(category, verbs)| {
            verbs
                .iter()
                .any(|v| v.eq_ignore_ascii_case(first_word))
                .then_some(*category)
        });
        let Some(category) = category else {
            continue;
        };

        let count = per_category.entry(category).or_insert(0);
        if *count >= MAX_PER_VERB_CATEGORY {
            continue;
        }
        *count += 1;
        achievements.push(collapse_whitespace(line));
    }

    achievements
}

fn tokenize_skills(section: &str) -> Vec<String> {
    section
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|' | '/' | '•' | '(' | ')'))
        .map(|token| token.trim_matches(|c: char| matches!(c, '.' | ':' | '-' | '*')))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .filter(|token| !SKILL_STOPWORDS.contains(&token.as_str()))
        .collect()
}
