//! Locates guardable statements in migration text.
//!
//! The scanner works on raw text with regular expressions rather than a SQL
//! grammar. Migration dumps are regular enough for that: policies are emitted
//! one per paragraph and `DO` blocks always close with `END $$;`.

mod patterns;

use std::ops::Range;

use regex::Regex;

use crate::error::GuardError;
use crate::statement::{StatementKind, StatementMatch, StatementShape};

/// An unconditional `DO $$ BEGIN ... END $$;` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DoBlock {
    /// Span of the whole block, including `DO` and the closing `$$;`.
    pub(crate) span: Range<usize>,
    /// Span of the body between `BEGIN` and `END`, trimmed of whitespace.
    pub(crate) body: Range<usize>,
}

impl DoBlock {
    fn contains(&self, offset: usize) -> bool {
        self.span.contains(&offset)
    }
}

/// A bare policy statement together with the `DO` block it sits in, if any.
#[derive(Debug, Clone)]
pub(crate) struct PolicyCandidate {
    pub(crate) statement: StatementMatch,
    pub(crate) enclosing: Option<DoBlock>,
}

/// Statement scanner bound to a single schema.
#[derive(Debug)]
pub(crate) struct Scanner {
    policy_head: Regex,
    do_block: Regex,
    policy_table: Regex,
    trigger_table: Regex,
    policy_marker: String,
    trigger_marker: String,
}

impl Scanner {
    /// Compiles the statement patterns for `schema`.
    pub(crate) fn new(schema: &str) -> Result<Self, GuardError> {
        Ok(Self {
            policy_head: Regex::new(&patterns::policy_head(schema))?,
            do_block: Regex::new(patterns::DO_BLOCK)?,
            policy_table: Regex::new(&patterns::policy_table(schema))?,
            trigger_table: Regex::new(&patterns::trigger_table(schema))?,
            policy_marker: format!("ON \"{schema}\""),
            trigger_marker: format!("ON {schema}."),
        })
    }

    /// Returns every `DO` block in document order.
    pub(crate) fn do_blocks(&self, source: &str) -> Vec<DoBlock> {
        self.do_block
            .captures_iter(source)
            .filter_map(|captures| {
                let span = captures.get(0)?.range();
                let body = captures.get(1)?.range();
                Some(DoBlock { span, body })
            })
            .collect()
    }

    /// Returns every bare `create policy` statement in document order.
    ///
    /// A statement runs from `create policy` to the first blank line after
    /// its `AS` keyword, or to the end of the document. Statements found
    /// inside a `DO` block resume scanning after that block so the tail of a
    /// guard is never mistaken for another statement.
    pub(crate) fn bare_policies(&self, source: &str, blocks: &[DoBlock]) -> Vec<PolicyCandidate> {
        let mut candidates = Vec::new();
        let mut cursor = 0;

        while let Some(captures) = self.policy_head.captures_at(source, cursor) {
            let (Some(head), Some(name), Some(table)) = (
                captures.get(0),
                captures.name("name"),
                captures.name("table"),
            ) else {
                break;
            };

            let start = head.start();
            let end = statement_end(source, head.end());
            let enclosing = blocks.iter().find(|block| block.contains(start)).cloned();
            cursor = enclosing
                .as_ref()
                .map_or(end, |block| block.span.end.max(head.end()));

            let statement = StatementMatch::new(
                StatementKind::Policy,
                StatementShape::BarePolicy,
                Some(name.as_str().to_owned()),
                table.as_str().to_owned(),
                start..end,
                start..end,
            );
            candidates.push(PolicyCandidate {
                statement,
                enclosing,
            });
        }

        candidates
    }

    /// Classifies `DO` blocks that define a policy or trigger on the schema.
    ///
    /// Policy bodies are recognised before trigger bodies. A body that
    /// mentions a policy on the schema but whose table cannot be extracted
    /// is dropped without trying the trigger rule.
    pub(crate) fn guardable_blocks(&self, source: &str, blocks: &[DoBlock]) -> Vec<StatementMatch> {
        blocks
            .iter()
            .filter_map(|block| {
                let body = source.get(block.body.clone())?;
                let (kind, table) = self.classify_body(body)?;
                Some(StatementMatch::new(
                    kind,
                    StatementShape::DoBlock,
                    None,
                    table,
                    block.span.clone(),
                    block.body.clone(),
                ))
            })
            .collect()
    }

    fn classify_body(&self, body: &str) -> Option<(StatementKind, String)> {
        if body.contains("CREATE POLICY") && body.contains(&self.policy_marker) {
            return first_group(&self.policy_table, body)
                .map(|table| (StatementKind::Policy, table));
        }
        if body.contains("CREATE TRIGGER") && body.contains(&self.trigger_marker) {
            return first_group(&self.trigger_table, body)
                .map(|table| (StatementKind::Trigger, table));
        }
        None
    }
}

fn first_group(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().to_owned())
}

/// Finds where a bare policy starting before `from` ends.
///
/// The statement stops at the first blank line, with either LF or CRLF line
/// endings. Without one it runs to the end of the document, leaving a single
/// trailing line ending outside the span.
fn statement_end(source: &str, from: usize) -> usize {
    let tail = source.get(from..).unwrap_or_default();
    let blank_line = [tail.find("\n\n"), tail.find("\r\n\r\n")]
        .into_iter()
        .flatten()
        .min();
    let length = blank_line.unwrap_or_else(|| {
        tail.strip_suffix("\r\n")
            .or_else(|| tail.strip_suffix('\n'))
            .unwrap_or(tail)
            .len()
    });
    from.saturating_add(length)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn scanner() -> Scanner {
        Scanner::new("public").unwrap_or_else(|err| panic!("scanner: {err}"))
    }

    #[rstest]
    fn bare_policy_stops_at_blank_line(scanner: Scanner) {
        let source = "create policy \"p1\" ON \"public\".\"t1\" AS permissive\nfor select;\n\nselect 1;\n";
        let candidates = scanner.bare_policies(source, &[]);

        assert_eq!(candidates.len(), 1);
        let statement = &candidates[0].statement;
        assert_eq!(statement.name(), Some("p1"));
        assert_eq!(statement.table(), "t1");
        assert_eq!(
            statement.text(source),
            "create policy \"p1\" ON \"public\".\"t1\" AS permissive\nfor select;"
        );
    }

    #[rstest]
    #[case("create policy \"p\" on \"public\".\"t\" as x;\n", "create policy \"p\" on \"public\".\"t\" as x;")]
    #[case("create policy \"p\" on \"public\".\"t\" as x;", "create policy \"p\" on \"public\".\"t\" as x;")]
    #[case("CREATE POLICY \"p\"\n  ON \"public\".\"t\"\n  AS x;\n\n", "CREATE POLICY \"p\"\n  ON \"public\".\"t\"\n  AS x;")]
    #[case("create policy \"p\" on \"public\".\"t\" as x;\r\n", "create policy \"p\" on \"public\".\"t\" as x;")]
    #[case("create policy \"p\"\r\non \"public\".\"t\"\r\nas x;\r\n\r\nselect 1;", "create policy \"p\"\r\non \"public\".\"t\"\r\nas x;")]
    fn bare_policy_end_of_document(scanner: Scanner, #[case] source: &str, #[case] expected: &str) {
        let candidates = scanner.bare_policies(source, &[]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].statement.text(source), expected);
    }

    #[rstest]
    fn bare_policy_ignores_other_schemas(scanner: Scanner) {
        let source = "create policy \"p\" ON \"auth\".\"users\" AS permissive;\n";
        assert!(scanner.bare_policies(source, &[]).is_empty());
    }

    #[rstest]
    fn do_block_body_is_trimmed(scanner: Scanner) {
        let source = "DO $$\nBEGIN\n  CREATE TRIGGER x AFTER INSERT ON public.orders;\nEND\n$$;";
        let blocks = scanner.do_blocks(source);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].span, 0..source.len());
        assert_eq!(
            source.get(blocks[0].body.clone()),
            Some("CREATE TRIGGER x AFTER INSERT ON public.orders;")
        );
    }

    #[rstest]
    fn do_block_ends_at_first_closing_marker(scanner: Scanner) {
        let source = "DO $$ BEGIN\n  IF x THEN y; END IF;\nEND $$;\nDO $$ BEGIN z; END $$;";
        let blocks = scanner.do_blocks(source);

        assert_eq!(blocks.len(), 2);
        assert_eq!(
            source.get(blocks[0].body.clone()),
            Some("IF x THEN y; END IF;")
        );
        assert_eq!(source.get(blocks[1].body.clone()), Some("z;"));
    }

    #[rstest]
    #[case(
        "CREATE POLICY \"read\" ON \"public\".\"orders\" FOR SELECT;",
        Some((StatementKind::Policy, "orders"))
    )]
    #[case(
        "CREATE TRIGGER audit AFTER UPDATE ON public.invoices FOR EACH ROW;",
        Some((StatementKind::Trigger, "invoices"))
    )]
    #[case("CREATE POLICY \"read\" ON \"public\" ;", None)]
    #[case("CREATE POLICY \"read\" ON \"public\" ; CREATE TRIGGER t ON public.x;", None)]
    #[case("ALTER TABLE public.orders ENABLE ROW LEVEL SECURITY;", None)]
    #[case("CREATE TRIGGER audit AFTER UPDATE ON auth.users;", None)]
    fn classifies_block_bodies(
        scanner: Scanner,
        #[case] body: &str,
        #[case] expected: Option<(StatementKind, &str)>,
    ) {
        let classified = scanner.classify_body(body);
        assert_eq!(
            classified
                .as_ref()
                .map(|(kind, table)| (*kind, table.as_str())),
            expected
        );
    }

    #[rstest]
    fn policies_inside_blocks_record_enclosing_block(scanner: Scanner) {
        let source = "DO $$\nBEGIN\n  create policy \"p\" ON \"public\".\"t\" AS x;\nEND\n$$;\n\ncreate policy \"q\" ON \"public\".\"t\" AS y;";
        let blocks = scanner.do_blocks(source);
        let candidates = scanner.bare_policies(source, &blocks);

        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].enclosing.is_some());
        assert!(candidates[1].enclosing.is_none());
        assert_eq!(candidates[1].statement.name(), Some("q"));
    }
}
