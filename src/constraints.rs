//! Constraint evaluation and assembly of the constraints a strategy must satisfy.
use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use semver::Version;

use crate::{
    models::{Constraint, Operator, StrategySelector},
    repository::Repository,
    Context,
};

impl Constraint {
    /// Return `true` if `context` satisfies this constraint.
    ///
    /// Unknown operators never match, even when inverted.
    pub fn is_satisfied(&self, context: &Context) -> bool {
        if self.operator == Operator::Unknown {
            return false;
        }
        self.try_eval(context).unwrap_or(false) != self.inverted
    }

    /// Try applying the operator, returning `None` if the operator cannot be applied (missing or
    /// unparsable values).
    fn try_eval(&self, context: &Context) -> Option<bool> {
        let context_value = context.resolve(&self.context_name);

        match self.operator {
            Operator::In | Operator::NotIn => {
                let is_in = context_value
                    .is_some_and(|value| self.clean_values().any(|v| v == &*value));
                Some(is_in == (self.operator == Operator::In))
            }

            Operator::StrStartsWith | Operator::StrEndsWith | Operator::StrContains => {
                let context_value = context_value?;
                let (context_value, values): (String, Vec<String>) = if self.case_insensitive {
                    (
                        context_value.to_lowercase(),
                        self.clean_values().map(str::to_lowercase).collect(),
                    )
                } else {
                    (
                        context_value.into_owned(),
                        self.clean_values().map(str::to_owned).collect(),
                    )
                };
                Some(values.iter().any(|v| match self.operator {
                    Operator::StrStartsWith => context_value.starts_with(v.as_str()),
                    Operator::StrEndsWith => context_value.ends_with(v.as_str()),
                    _ => context_value.contains(v.as_str()),
                }))
            }

            Operator::NumEq
            | Operator::NumGt
            | Operator::NumGte
            | Operator::NumLt
            | Operator::NumLte => {
                let expected: f64 = self.value.as_deref()?.trim().parse().ok()?;
                let actual: f64 = context_value?.trim().parse().ok()?;
                let ordering = actual.partial_cmp(&expected)?;
                Some(match self.operator {
                    Operator::NumEq => ordering == Ordering::Equal,
                    Operator::NumGt => ordering == Ordering::Greater,
                    Operator::NumGte => ordering != Ordering::Less,
                    Operator::NumLt => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                })
            }

            Operator::DateAfter | Operator::DateBefore => {
                let expected = DateTime::parse_from_rfc3339(self.value.as_deref()?.trim())
                    .ok()?
                    .with_timezone(&Utc);
                let now = context.current_time.unwrap_or_else(Utc::now);
                Some(if self.operator == Operator::DateAfter {
                    now > expected
                } else {
                    now < expected
                })
            }

            Operator::SemverEq | Operator::SemverGt | Operator::SemverLt => {
                let expected = parse_version(self.value.as_deref()?)?;
                let actual = parse_version(&context_value?)?;
                Some(match self.operator {
                    Operator::SemverEq => actual == expected,
                    Operator::SemverGt => actual > expected,
                    _ => actual < expected,
                })
            }

            Operator::Unknown => None,
        }
    }

    /// Non-empty values with surrounding whitespace removed.
    fn clean_values(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

fn parse_version(s: &str) -> Option<Version> {
    let s = s.trim();
    Version::parse(s.strip_prefix('v').unwrap_or(s)).ok()
}

/// The ordered constraints one strategy selector must satisfy: inline constraints first, then
/// the constraints of every referenced segment.
///
/// A segment that cannot be found yields a single `None`, which callers must treat as a failed
/// constraint. The source is cheap to copy and every call to [`iter`](Self::iter) starts over.
#[derive(Clone, Copy)]
pub struct ConstraintSource<'a> {
    selector: &'a StrategySelector,
    repository: &'a dyn Repository,
}

impl<'a> ConstraintSource<'a> {
    pub fn new(selector: &'a StrategySelector, repository: &'a dyn Repository) -> Self {
        ConstraintSource {
            selector,
            repository,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&'a Constraint>> + 'a {
        let ConstraintSource {
            selector,
            repository,
        } = *self;
        let inline = selector.constraints.iter().map(Some);
        let from_segments = selector.segments.iter().flat_map(move |&id| {
            let segment = repository.get_segment(id);
            let constraints = segment
                .into_iter()
                .flat_map(|segment| segment.constraints.iter().map(Some));
            let unresolved = segment.is_none().then_some(None);
            constraints.chain(unresolved)
        });
        inline.chain(from_segments)
    }

    /// Return `true` if every constraint resolves and is satisfied by `context`.
    pub fn all_satisfied(&self, context: &Context) -> bool {
        self.iter()
            .all(|constraint| constraint.is_some_and(|c| c.is_satisfied(context)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::ConstraintSource;
    use crate::{
        models::{ClientFeatures, Constraint, Operator, Segment, StrategySelector},
        Context, Snapshot,
    };

    fn user(id: &str) -> Context {
        Context {
            user_id: Some(id.to_owned()),
            ..Context::default()
        }
    }

    #[test]
    fn in_and_not_in() {
        let c = Constraint::new("userId", Operator::In, [" alice ", "bob", ""]);
        assert!(c.is_satisfied(&user("alice")));
        assert!(c.is_satisfied(&user("bob")));
        assert!(!c.is_satisfied(&user("charlie")));
        assert!(!c.is_satisfied(&Context::default()));

        let c = Constraint::new("userId", Operator::NotIn, ["alice"]);
        assert!(!c.is_satisfied(&user("alice")));
        assert!(c.is_satisfied(&user("bob")));
        // Absent values are never in the list.
        assert!(c.is_satisfied(&Context::default()));
    }

    #[test]
    fn inverted() {
        let c = Constraint {
            inverted: true,
            ..Constraint::new("userId", Operator::In, ["alice"])
        };
        assert!(!c.is_satisfied(&user("alice")));
        assert!(c.is_satisfied(&user("bob")));
    }

    #[test]
    fn string_operators() {
        let context = Context::default().with_property("email", "Alice@Example.com");

        assert!(Constraint::new("email", Operator::StrEndsWith, ["@Example.com"]).is_satisfied(&context));
        assert!(!Constraint::new("email", Operator::StrEndsWith, ["@example.com"]).is_satisfied(&context));
        assert!(Constraint {
            case_insensitive: true,
            ..Constraint::new("email", Operator::StrEndsWith, ["@EXAMPLE.COM"])
        }
        .is_satisfied(&context));
        assert!(Constraint::new("email", Operator::StrStartsWith, ["bob", "Ali"]).is_satisfied(&context));
        assert!(Constraint::new("email", Operator::StrContains, ["@Ex"]).is_satisfied(&context));
        assert!(!Constraint::new("missing", Operator::StrContains, [""]).is_satisfied(&context));
    }

    #[test]
    fn numeric_operators() {
        let context = Context::default().with_property("age", "18");

        assert!(Constraint::single("age", Operator::NumEq, "18").is_satisfied(&context));
        assert!(Constraint::single("age", Operator::NumEq, "18.0").is_satisfied(&context));
        assert!(Constraint::single("age", Operator::NumGte, "18").is_satisfied(&context));
        assert!(!Constraint::single("age", Operator::NumGt, "18").is_satisfied(&context));
        assert!(Constraint::single("age", Operator::NumLte, "18").is_satisfied(&context));
        assert!(Constraint::single("age", Operator::NumLt, "18.5").is_satisfied(&context));
        assert!(!Constraint::single("age", Operator::NumLt, "not-a-number").is_satisfied(&context));
        assert!(!Constraint::single("height", Operator::NumLt, "10").is_satisfied(&context));
    }

    #[test]
    fn date_operators() {
        let context = Context {
            current_time: Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
            ..Context::default()
        };

        assert!(Constraint::single("currentTime", Operator::DateAfter, "2024-01-01T00:00:00Z")
            .is_satisfied(&context));
        assert!(!Constraint::single("currentTime", Operator::DateBefore, "2024-01-01T00:00:00Z")
            .is_satisfied(&context));
        assert!(Constraint::single("currentTime", Operator::DateBefore, "2024-06-01T13:00:00+00:00")
            .is_satisfied(&context));
        assert!(!Constraint::single("currentTime", Operator::DateAfter, "yesterday")
            .is_satisfied(&context));
    }

    #[test]
    fn semver_operators() {
        let context = Context::default().with_property("version", "1.2.3");

        assert!(Constraint::single("version", Operator::SemverEq, "1.2.3").is_satisfied(&context));
        assert!(Constraint::single("version", Operator::SemverGt, "1.2.0").is_satisfied(&context));
        assert!(Constraint::single("version", Operator::SemverLt, "1.10.0").is_satisfied(&context));
        assert!(!Constraint::single("version", Operator::SemverLt, "1.2.3-beta.1").is_satisfied(&context));
        assert!(!Constraint::single("version", Operator::SemverEq, "1.2").is_satisfied(&context));
        assert!(!Constraint::single("missing", Operator::SemverEq, "1.2.3").is_satisfied(&context));
    }

    #[test]
    fn unknown_operator_never_matches() {
        let c = Constraint {
            inverted: true,
            ..Constraint::new("userId", Operator::Unknown, ["alice"])
        };
        assert!(!c.is_satisfied(&user("alice")));
        assert!(!c.is_satisfied(&user("bob")));
    }

    fn snapshot_with_segment() -> Snapshot {
        Snapshot::new(ClientFeatures {
            segments: vec![Segment {
                id: 1,
                name: Some("beta-testers".into()),
                constraints: vec![
                    Constraint::new("tenant", Operator::In, ["acme"]),
                    Constraint::new("userId", Operator::In, ["alice", "bob"]),
                ],
            }],
            ..ClientFeatures::default()
        })
    }

    #[test]
    fn inline_constraints_come_before_segments() {
        let snapshot = snapshot_with_segment();
        let selector = StrategySelector {
            constraints: vec![Constraint::new("environment", Operator::In, ["prod"])],
            segments: vec![1],
            ..StrategySelector::new("default", Vec::<(String, String)>::new())
        };

        let source = ConstraintSource::new(&selector, &snapshot);
        let names: Vec<_> = source
            .iter()
            .map(|c| c.map(|c| c.context_name.as_str()))
            .collect();
        assert_eq!(names, vec![Some("environment"), Some("tenant"), Some("userId")]);

        // Restartable.
        assert_eq!(source.iter().count(), 3);
    }

    #[test]
    fn missing_segment_yields_sentinel() {
        let snapshot = snapshot_with_segment();
        let selector = StrategySelector {
            segments: vec![42, 1],
            ..StrategySelector::new("default", Vec::<(String, String)>::new())
        };

        let source = ConstraintSource::new(&selector, &snapshot);
        let resolved: Vec<_> = source.iter().map(|c| c.is_some()).collect();
        assert_eq!(resolved, vec![false, true, true]);

        let context = user("alice").with_property("tenant", "acme");
        assert!(!source.all_satisfied(&context));
    }

    #[test]
    fn segment_constraints_are_enforced() {
        let snapshot = snapshot_with_segment();
        let selector = StrategySelector {
            segments: vec![1],
            ..StrategySelector::new("default", Vec::<(String, String)>::new())
        };
        let source = ConstraintSource::new(&selector, &snapshot);

        assert!(source.all_satisfied(&user("alice").with_property("tenant", "acme")));
        assert!(!source.all_satisfied(&user("alice").with_property("tenant", "other")));
        assert!(!source.all_satisfied(&user("carol").with_property("tenant", "acme")));
    }
}
