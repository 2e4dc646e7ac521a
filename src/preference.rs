// Free-text teacher preferences, parsed once into rules.
// `score` and `is_satisfied` read the same rules but disagree on "только <day>":
// scoring only rewards that day, the check rejects every other day.

use crate::data::{PairIndex, Weekday};

const ONLY: &str = "только";
const DO_NOT_OCCUPY: &str = "не занимать";
const EXCEPT: &str = "кроме";

const ONLY_DAY_BONUS: i32 = 200;
const EXCLUDED_DAY_PENALTY: i32 = -500;
const MENTIONED_DAY_BONUS: i32 = 80;
const PAIR_RANGE_BONUS: i32 = 100;
const PAIR_RANGE_PENALTY: i32 = -200;
const SINGLE_PAIR_BONUS: i32 = 150;
const SINGLE_PAIR_PENALTY: i32 = -300;

/// Keyword that introduced a day exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// "не занимать <day>"
    DoNotOccupy,
    /// "кроме <day>"
    Except,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// "только <day>". `compact` marks the spaceless "только<day>" form, which
    /// only the satisfaction check honours.
    OnlyDay { day: Weekday, compact: bool },
    ExcludeDay { day: Weekday, keyword: Exclusion },
    /// The day token appears anywhere in the text.
    MentionDay(Weekday),
    /// Inclusive pair window.
    PairRange { first: PairIndex, last: PairIndex },
    SinglePair(PairIndex),
}

const PAIR_PATTERNS: [(&str, Rule); 4] = [
    ("только 1-2 пары", Rule::PairRange { first: 1, last: 2 }),
    ("только 3-4 пары", Rule::PairRange { first: 3, last: 4 }),
    ("только 1 пара", Rule::SinglePair(1)),
    ("только 4 пары", Rule::SinglePair(4)),
];

/// Parsed preference text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceRules {
    rules: Vec<Rule>,
    /// The text contains "не занимать" or "кроме" somewhere.
    negated: bool,
}

impl PreferenceRules {
    pub fn parse(text: &str) -> Self {
        let text = text.to_lowercase();
        let mut rules = Vec::new();

        for day in Weekday::ALL {
            let token = day.token();
            if text.contains(&format!("{ONLY} {token}")) {
                rules.push(Rule::OnlyDay { day, compact: false });
            } else if text.contains(&format!("{ONLY}{token}")) {
                rules.push(Rule::OnlyDay { day, compact: true });
            }
            if text.contains(&format!("{DO_NOT_OCCUPY} {token}")) {
                rules.push(Rule::ExcludeDay {
                    day,
                    keyword: Exclusion::DoNotOccupy,
                });
            }
            if text.contains(&format!("{EXCEPT} {token}")) {
                rules.push(Rule::ExcludeDay {
                    day,
                    keyword: Exclusion::Except,
                });
            }
            if text.contains(token) {
                rules.push(Rule::MentionDay(day));
            }
        }

        for (pattern, rule) in PAIR_PATTERNS {
            if text.contains(pattern) {
                rules.push(rule);
            }
        }

        Self {
            rules,
            negated: text.contains(DO_NOT_OCCUPY) || text.contains(EXCEPT),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Preference term of a slot score; 0 for a text with no recognised rule.
    pub fn score(&self, day: Weekday, pair: PairIndex) -> i32 {
        let mut score = 0;
        let mut excluded = false;

        for rule in &self.rules {
            match *rule {
                Rule::OnlyDay { day: only, compact: false } if only == day => {
                    score += ONLY_DAY_BONUS
                }
                Rule::ExcludeDay { day: excl, .. } if excl == day => excluded = true,
                Rule::MentionDay(mentioned) if mentioned == day && !self.negated => {
                    score += MENTIONED_DAY_BONUS
                }
                Rule::PairRange { first, last } => {
                    score += if (first..=last).contains(&pair) {
                        PAIR_RANGE_BONUS
                    } else {
                        PAIR_RANGE_PENALTY
                    }
                }
                Rule::SinglePair(only) => {
                    score += if pair == only {
                        SINGLE_PAIR_BONUS
                    } else {
                        SINGLE_PAIR_PENALTY
                    }
                }
                _ => {}
            }
        }

        // Both exclusion keywords for the same day still cost one penalty.
        if excluded {
            score += EXCLUDED_DAY_PENALTY;
        }
        score
    }

    /// Whether a lesson at (`day`, `pair`) honours this preference.
    pub fn is_satisfied(&self, day: Weekday, pair: PairIndex) -> bool {
        if self.excludes(day) {
            return false;
        }

        if self.has_only_day() && !self.only_day(day) {
            let mentioned: Vec<Weekday> = self
                .rules
                .iter()
                .filter_map(|rule| match *rule {
                    Rule::MentionDay(d) if !self.excludes_with(d, Exclusion::DoNotOccupy) => {
                        Some(d)
                    }
                    _ => None,
                })
                .collect();
            if !mentioned.is_empty() && !mentioned.contains(&day) {
                return false;
            }
        }

        self.rules.iter().all(|rule| match *rule {
            Rule::PairRange { first, last } => (first..=last).contains(&pair),
            Rule::SinglePair(only) => pair == only,
            _ => true,
        })
    }

    fn excludes(&self, day: Weekday) -> bool {
        self.rules
            .iter()
            .any(|rule| matches!(*rule, Rule::ExcludeDay { day: d, .. } if d == day))
    }

    fn excludes_with(&self, day: Weekday, keyword: Exclusion) -> bool {
        self.rules.iter().any(|rule| {
            matches!(*rule, Rule::ExcludeDay { day: d, keyword: k } if d == day && k == keyword)
        })
    }

    fn has_only_day(&self) -> bool {
        self.rules.iter().any(|rule| matches!(rule, Rule::OnlyDay { .. }))
    }

    fn only_day(&self, day: Weekday) -> bool {
        self.rules
            .iter()
            .any(|rule| matches!(*rule, Rule::OnlyDay { day: d, .. } if d == day))
    }
}
