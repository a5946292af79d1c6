//! Ordered rule chain.

use tracing::debug;

use crate::config::types::RuleConfig;
use crate::rule::{build_rule, RejectReason, Rule, RuleContext, RuleOutcome};

/// Rules applied in declared order.
#[derive(Debug, Default)]
pub struct RuleChain {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from rule configs.
    ///
    /// Errors carry the failing rule's index and type.
    pub fn from_configs(configs: &[RuleConfig]) -> Result<Self, String> {
        let rules = configs
            .iter()
            .enumerate()
            .map(|(i, config)| {
                build_rule(config).map_err(|e| format!("rules[{}] ({}): {}", i, config.rule_type, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Append a rule after the configured ones.
    pub fn push(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Run `text` through every rule the sender doesn't bypass.
    ///
    /// Stops at the first rejection. A message that is blank before or
    /// after the chain is rejected as empty.
    pub fn apply(&self, ctx: &RuleContext<'_>, text: &str) -> RuleOutcome {
        if text.trim().is_empty() {
            return RuleOutcome::Rejected(RejectReason::EmptyMessage);
        }

        let mut current = text.to_string();
        for rule in &self.rules {
            if rule
                .bypass_permission()
                .is_some_and(|permission| ctx.sender.has_permission(permission))
            {
                continue;
            }

            match rule.apply(ctx, current) {
                RuleOutcome::Transformed(next) => current = next,
                RuleOutcome::Rejected(reason) => {
                    debug!(rule = rule.name(), %reason, "Message rejected");
                    return RuleOutcome::Rejected(reason);
                }
            }
        }

        if current.trim().is_empty() {
            return RuleOutcome::Rejected(RejectReason::EmptyMessage);
        }
        RuleOutcome::Transformed(current)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::user::UserState;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl Rule for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn apply(&self, _ctx: &RuleContext<'_>, text: String) -> RuleOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RuleOutcome::Transformed(text)
        }
    }

    fn run(chain: &RuleChain, sender: &UserState, text: &str) -> RuleOutcome {
        let channel = Channel::private_default("test");
        chain.apply(
            &RuleContext {
                sender,
                channel: &channel,
            },
            text,
        )
    }

    fn blocked(pattern: &str) -> RuleConfig {
        RuleConfig {
            rule_type: "blocked_words".to_string(),
            patterns: vec![pattern.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_rules_apply_in_order() {
        let chain = RuleChain::from_configs(&[
            RuleConfig {
                rule_type: "replace".to_string(),
                pattern: Some("cat".to_string()),
                replacement: "dog".to_string(),
                ..Default::default()
            },
            RuleConfig {
                rule_type: "replace".to_string(),
                pattern: Some("dog".to_string()),
                replacement: "bird".to_string(),
                ..Default::default()
            },
        ])
        .unwrap();

        assert_eq!(
            run(&chain, &UserState::default(), "my cat"),
            RuleOutcome::Transformed("my bird".to_string())
        );
    }

    #[test]
    fn test_rejection_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut chain = RuleChain::from_configs(&[blocked("badword")]).unwrap();
        chain.push(Box::new(Counting {
            calls: Arc::clone(&calls),
        }));

        let outcome = run(&chain, &UserState::default(), "a badword here");
        assert!(matches!(
            outcome,
            RuleOutcome::Rejected(RejectReason::BlockedWord { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        run(&chain, &UserState::default(), "clean");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_message_rejected() {
        let chain = RuleChain::new();
        assert_eq!(
            run(&chain, &UserState::default(), "   "),
            RuleOutcome::Rejected(RejectReason::EmptyMessage)
        );

        // Emptied by a rule
        let chain = RuleChain::from_configs(&[RuleConfig {
            rule_type: "replace".to_string(),
            pattern: Some(".*".to_string()),
            replacement: String::new(),
            ..Default::default()
        }])
        .unwrap();
        assert_eq!(
            run(&chain, &UserState::default(), "gone"),
            RuleOutcome::Rejected(RejectReason::EmptyMessage)
        );
    }

    #[test]
    fn test_bypass_permission_skips_rule() {
        let mut config = blocked("badword");
        config.bypass_permission = Some("herald.bypass.filter".to_string());
        let chain = RuleChain::from_configs(&[config]).unwrap();

        let staff = UserState {
            permissions: Arc::new(["herald.bypass.filter".to_string()].into_iter().collect()),
            ..Default::default()
        };
        assert_eq!(
            run(&chain, &staff, "badword"),
            RuleOutcome::Transformed("badword".to_string())
        );
        assert!(matches!(
            run(&chain, &UserState::default(), "badword"),
            RuleOutcome::Rejected(_)
        ));
    }

    #[test]
    fn test_build_error_names_rule() {
        let err = RuleChain::from_configs(&[
            blocked("ok"),
            RuleConfig {
                rule_type: "teleport".to_string(),
                ..Default::default()
            },
        ])
        .unwrap_err();
        assert!(err.starts_with("rules[1] (teleport)"));
        assert!(err.contains("unknown rule type"));
    }
}
