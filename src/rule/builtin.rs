//! Rule kinds available from configuration.
//!
//! Pattern-based rules use `fancy_regex`, so lookarounds are allowed in
//! configured patterns.

use fancy_regex::Regex;
use tracing::warn;

use crate::common::regex::try_replace_all;
use crate::config::types::RuleConfig;
use crate::rule::{RejectReason, Rule, RuleContext, RuleOutcome};

/// Matches http(s) URLs, `www.` hosts and bare domains on common TLDs.
const LINK_PATTERN: &str =
    r"(?i)(?:https?://|www\.)\S+|\b[a-z0-9-]+(?:\.[a-z0-9-]+)*\.(?:com|net|org|io|gg|me|co|tv|xyz)\b";

/// Build a rule from its config.
pub fn build_rule(config: &RuleConfig) -> Result<Box<dyn Rule>, String> {
    let bypass = config.bypass_permission.clone();

    let rule: Box<dyn Rule> = match config.rule_type.to_lowercase().as_str() {
        "blocked_words" => {
            if config.patterns.is_empty() {
                return Err("patterns is required".to_string());
            }
            Box::new(BlockedWordsRule {
                patterns: compile_patterns(&config.patterns)?,
                bypass,
            })
        }
        "replace" => {
            let pattern = config
                .pattern
                .as_deref()
                .ok_or_else(|| "pattern is required".to_string())?;
            Box::new(ReplaceRule {
                pattern: compile_pattern(pattern)?,
                replacement: config.replacement.clone(),
                bypass,
            })
        }
        "max_length" => {
            let limit = config.limit.ok_or_else(|| "limit is required".to_string())?;
            if limit == 0 {
                return Err("limit must be non-zero".to_string());
            }
            Box::new(MaxLengthRule { limit, bypass })
        }
        "caps" => {
            let ratio = config.ratio.unwrap_or(0.7);
            if !(0.0..=1.0).contains(&ratio) {
                return Err(format!("ratio must be between 0 and 1 (got {})", ratio));
            }
            Box::new(CapsRule {
                ratio,
                min_length: config.min_length.unwrap_or(6),
                bypass,
            })
        }
        "links" => Box::new(LinksRule {
            pattern: compile_pattern(LINK_PATTERN)?,
            permission: config.permission.clone(),
            bypass,
        }),
        other => return Err(format!("unknown rule type '{}'", other)),
    };

    Ok(rule)
}

/// A compiled regex pattern with its original string for debugging.
#[derive(Debug)]
struct CompiledPattern {
    original: String,
    regex: Regex,
}

impl CompiledPattern {
    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text).unwrap_or_else(|e| {
            warn!("Regex match error for pattern '{}': {}", self.original, e);
            false
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<CompiledPattern, String> {
    Regex::new(pattern)
        .map(|regex| CompiledPattern {
            original: pattern.to_string(),
            regex,
        })
        .map_err(|e| format!("'{}' is not a valid regex: {}", pattern, e))
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<CompiledPattern>, String> {
    patterns.iter().map(|p| compile_pattern(p)).collect()
}

/// Rejects messages matching any pattern.
#[derive(Debug)]
struct BlockedWordsRule {
    patterns: Vec<CompiledPattern>,
    bypass: Option<String>,
}

impl Rule for BlockedWordsRule {
    fn name(&self) -> &str {
        "blocked_words"
    }

    fn bypass_permission(&self) -> Option<&str> {
        self.bypass.as_deref()
    }

    fn apply(&self, _ctx: &RuleContext<'_>, text: String) -> RuleOutcome {
        match self.patterns.iter().find(|p| p.is_match(&text)) {
            Some(p) => RuleOutcome::Rejected(RejectReason::BlockedWord {
                pattern: p.original.clone(),
            }),
            None => RuleOutcome::Transformed(text),
        }
    }
}

/// Rewrites every match of a pattern.
#[derive(Debug)]
struct ReplaceRule {
    pattern: CompiledPattern,
    replacement: String,
    bypass: Option<String>,
}

impl Rule for ReplaceRule {
    fn name(&self) -> &str {
        "replace"
    }

    fn bypass_permission(&self) -> Option<&str> {
        self.bypass.as_deref()
    }

    /// A pattern that fails at runtime leaves the text unchanged.
    fn apply(&self, _ctx: &RuleContext<'_>, text: String) -> RuleOutcome {
        match try_replace_all(&self.pattern.regex, &text, self.replacement.as_str()) {
            Ok(replaced) => RuleOutcome::Transformed(replaced),
            Err(e) => {
                warn!("Regex replace error for pattern '{}': {}", self.pattern.original, e);
                RuleOutcome::Transformed(text)
            }
        }
    }
}

/// Rejects messages over a character limit.
#[derive(Debug)]
struct MaxLengthRule {
    limit: usize,
    bypass: Option<String>,
}

impl Rule for MaxLengthRule {
    fn name(&self) -> &str {
        "max_length"
    }

    fn bypass_permission(&self) -> Option<&str> {
        self.bypass.as_deref()
    }

    fn apply(&self, _ctx: &RuleContext<'_>, text: String) -> RuleOutcome {
        if text.chars().count() > self.limit {
            RuleOutcome::Rejected(RejectReason::TooLong { limit: self.limit })
        } else {
            RuleOutcome::Transformed(text)
        }
    }
}

/// Lower-cases shouting.
#[derive(Debug)]
struct CapsRule {
    ratio: f64,
    min_length: usize,
    bypass: Option<String>,
}

impl Rule for CapsRule {
    fn name(&self) -> &str {
        "caps"
    }

    fn bypass_permission(&self) -> Option<&str> {
        self.bypass.as_deref()
    }

    fn apply(&self, _ctx: &RuleContext<'_>, text: String) -> RuleOutcome {
        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        if letters < self.min_length {
            return RuleOutcome::Transformed(text);
        }

        let upper = text.chars().filter(|c| c.is_uppercase()).count();
        if upper as f64 / letters as f64 > self.ratio {
            RuleOutcome::Transformed(text.to_lowercase())
        } else {
            RuleOutcome::Transformed(text)
        }
    }
}

/// Rejects links unless the sender has the link permission.
#[derive(Debug)]
struct LinksRule {
    pattern: CompiledPattern,
    permission: Option<String>,
    bypass: Option<String>,
}

impl Rule for LinksRule {
    fn name(&self) -> &str {
        "links"
    }

    fn bypass_permission(&self) -> Option<&str> {
        self.bypass.as_deref()
    }

    fn apply(&self, ctx: &RuleContext<'_>, text: String) -> RuleOutcome {
        let allowed = self
            .permission
            .as_deref()
            .is_some_and(|permission| ctx.sender.has_permission(permission));

        if !allowed && self.pattern.is_match(&text) {
            RuleOutcome::Rejected(RejectReason::LinksNotAllowed)
        } else {
            RuleOutcome::Transformed(text)
        }
    }
}
