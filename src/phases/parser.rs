//! Parsers for trigger expressions and result scripts
//!
//! Triggers ignore whitespace entirely. Unknown trigger terms parse to
//! [`Term::Unrecognized`]; unknown directives are dropped.

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_till};
use nom::character::complete::{alpha1, char, i64 as integer, u32 as count, u64 as natural};
use nom::combinator::{all_consuming, map, map_opt, opt, rest, value};
use nom::multi::separated_list1;
use nom::sequence::preceded;
use nom::{IResult, Parser};

use crate::actions::Action;
use crate::core::types::{EnemyId, Stat};
use crate::phases::ast::{Clause, Comparison, Term, Trigger};
use crate::phases::script::Directive;

fn start(input: &str) -> IResult<&str, Term> {
    value(Term::Start, tag_no_case("start")).parse(input)
}

fn turn(input: &str) -> IResult<&str, Term> {
    map(
        (tag_no_case("t"), opt(char('+')), natural),
        |(_, plus, n)| match plus {
            Some(_) => Term::TurnMultiple(n),
            None => Term::Turn(n),
        },
    )
    .parse(input)
}

fn comparison(input: &str) -> IResult<&str, Comparison> {
    alt((
        value(Comparison::Le, tag("<=")),
        value(Comparison::Ge, tag(">=")),
        value(Comparison::Eq, char('=')),
        value(Comparison::Lt, char('<')),
        value(Comparison::Gt, char('>')),
    ))
    .parse(input)
}

fn enemy(input: &str) -> IResult<&str, Term> {
    map_opt(
        (tag_no_case("e"), natural, comparison, integer, alpha1),
        |(_, idx, cmp, value, stat): (&str, u64, Comparison, i64, &str)| {
            let id = usize::try_from(idx).ok()?.checked_sub(1)?;
            let stat = stat.parse::<Stat>().ok()?;
            Some(Term::Enemy {
                id: EnemyId(id),
                cmp,
                value,
                stat,
            })
        },
    )
    .parse(input)
}

/// Parse one whitespace-free trigger term
pub fn parse_term(token: &str) -> Term {
    match all_consuming(alt((start, turn, enemy))).parse(token) {
        Ok((_, term)) => term,
        Err(_) => Term::Unrecognized(token.to_string()),
    }
}

fn term_token(input: &str) -> IResult<&str, &str> {
    take_till(|c| c == '|' || c == '&').parse(input)
}

fn trigger_tokens(input: &str) -> IResult<&str, Vec<Vec<&str>>> {
    separated_list1(char('|'), separated_list1(char('&'), term_token)).parse(input)
}

/// Parse a trigger expression into clauses of terms
pub fn parse_trigger(source: &str) -> Trigger {
    let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
    let Ok((_, tokens)) = all_consuming(trigger_tokens).parse(compact.as_str()) else {
        return Trigger::default();
    };

    Trigger {
        clauses: tokens
            .into_iter()
            .map(|terms| Clause {
                terms: terms.into_iter().map(parse_term).collect(),
            })
            .collect(),
    }
}

fn numbers(input: &str) -> IResult<&str, Vec<i64>> {
    separated_list1(char(','), integer).parse(input)
}

fn move_directive(input: &str) -> IResult<&str, Directive> {
    map_opt(preceded(tag_no_case("move:"), numbers), |codes| {
        match codes.as_slice() {
            [enemy, action] => Some(Directive::EnemyMove {
                enemy: usize::try_from(*enemy).ok()?,
                action: usize::try_from(*action).ok()?,
            }),
            [a, h, k, o, s, t] => Some(Directive::InlineMove {
                action: Action::from_codes(&[*a, *h, *k, *o, *s, *t])?,
                slot: None,
            }),
            [a, h, k, o, s, t, slot] => Some(Directive::InlineMove {
                action: Action::from_codes(&[*a, *h, *k, *o, *s, *t])?,
                slot: Some(usize::try_from(*slot).ok()?),
            }),
            _ => None,
        }
    })
    .parse(input)
}

fn spawn_directive(input: &str) -> IResult<&str, Directive> {
    map_opt(
        (tag_no_case("spawn:"), natural, char(','), count),
        |(_, id, _, count): (&str, u64, char, u32)| {
            let id = usize::try_from(id).ok()?.checked_sub(1)?;
            Some(Directive::Spawn {
                enemy: EnemyId(id),
                count,
            })
        },
    )
    .parse(input)
}

fn event_directive(input: &str) -> IResult<&str, Directive> {
    map_opt(preceded(tag_no_case("event"), natural), |n| {
        Some(Directive::Event(usize::try_from(n).ok()?))
    })
    .parse(input)
}

fn directive(input: &str) -> IResult<&str, Directive> {
    alt((
        value(Directive::Win, tag_no_case("win")),
        value(Directive::Lose, tag_no_case("lose")),
        move_directive,
        spawn_directive,
        event_directive,
    ))
    .parse(input)
}

fn system_directive(input: &str) -> IResult<&str, Directive> {
    map(preceded(tag_no_case("sys:"), rest), |text: &str| {
        Directive::System(text.trim().to_string())
    })
    .parse(input)
}

/// Parse one `&`-separated segment of a result script
pub fn parse_directive(segment: &str) -> Option<Directive> {
    let trimmed = segment.trim();
    if let Ok((_, sys)) = system_directive(trimmed) {
        return Some(sys);
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let parsed = all_consuming(directive)
        .parse(compact.as_str())
        .ok()
        .map(|(_, directive)| directive);
    parsed
}

/// Parse a result script, dropping malformed directives
pub fn parse_script(source: &str) -> Vec<Directive> {
    source
        .split('&')
        .filter(|segment| !segment.trim().is_empty())
        .filter_map(|segment| {
            let parsed = parse_directive(segment);
            if parsed.is_none() {
                tracing::warn!(directive = segment.trim(), "skipping malformed directive");
            }
            parsed
        })
        .collect()
}
