use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use super::{CommonSelectors, MappedAttribute};
use crate::document::DocumentQuery;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new("[0-9]+").expect("digit pattern is valid"));

const FOOT_IN_CM: f64 = 30.48;
const INCH_IN_CM: f64 = 2.54;
const LB_IN_KG: f64 = 0.453_592_37;

/// One `regex` → `with` rewrite. `with` may reference capture groups (`$1`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegexReplace {
    pub regex: String,
    #[serde(default)]
    pub with: String,
}

impl RegexReplace {
    pub fn new(regex: impl Into<String>, with: impl Into<String>) -> Self {
        Self { regex: regex.into(), with: with.into() }
    }

    /// Compiles the pattern, logging and returning `None` if it is invalid.
    pub(crate) fn compile(&self) -> Option<Regex> {
        match Regex::new(&self.regex) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Error compiling regex '{}': {}", self.regex, e);
                None
            }
        }
    }
}

/// A post-processing step, applied to every value of a field in order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcessStep {
    /// Regex rewrites. A value matched by none of the rules is dropped.
    Replace(Vec<RegexReplace>),
    /// Literal suffix.
    Append(String),
    /// Treat the value as a URL and evaluate a nested attribute against that document.
    SubScraper(Box<MappedAttribute>),
    /// Normalise a date in the given chrono format to `YYYY-MM-DD`.
    ParseDate(String),
    /// Exact value substitution; unmapped values pass through.
    Map(HashMap<String, String>),
    FeetToCm(bool),
    LbToKg(bool),
}

impl PostProcessStep {
    pub fn apply(&self, values: Vec<String>, q: &dyn DocumentQuery, common: &CommonSelectors) -> Vec<String> {
        match self {
            PostProcessStep::Replace(rules) => {
                let compiled: Vec<(Regex, &str)> =
                    rules.iter().filter_map(|r| r.compile().map(|re| (re, r.with.as_str()))).collect();
                values.into_iter().filter_map(|v| replace(v, &compiled)).collect()
            }
            PostProcessStep::Append(suffix) => values.into_iter().map(|v| v + suffix).collect(),
            PostProcessStep::SubScraper(attr) => values.iter().filter_map(|v| sub_scrape(v, attr, q, common)).collect(),
            PostProcessStep::ParseDate(format) => values.into_iter().map(|v| parse_date(v, format)).collect(),
            PostProcessStep::Map(map) => values
                .into_iter()
                .map(|v| map.get(&v).cloned().unwrap_or(v))
                .collect(),
            PostProcessStep::FeetToCm(true) => values.iter().map(|v| feet_to_cm(v)).collect(),
            PostProcessStep::LbToKg(true) => values.into_iter().map(lb_to_kg).collect(),
            PostProcessStep::FeetToCm(false) | PostProcessStep::LbToKg(false) => values,
        }
    }
}

fn replace(value: String, rules: &[(Regex, &str)]) -> Option<String> {
    let mut matched = false;
    let mut value = value;

    for (re, with) in rules {
        if re.is_match(&value) {
            matched = true;
            value = re.replace_all(&value, *with).into_owned();
        }
    }

    matched.then_some(value)
}

fn sub_scrape(value: &str, attr: &MappedAttribute, q: &dyn DocumentQuery, common: &CommonSelectors) -> Option<String> {
    let sub = q.sub_scrape(value)?;
    attr.evaluate(sub.as_ref(), common).into_iter().next()
}

fn parse_date(value: String, format: &str) -> String {
    let trimmed = value.trim();

    let parsed = NaiveDate::parse_from_str(trimmed, format)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, format).map(|dt| dt.date()));

    match parsed {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(e) => {
            warn!("Error parsing date string '{}' using format '{}': {}", trimmed, format, e);
            value
        }
    }
}

fn feet_to_cm(value: &str) -> String {
    let mut numbers = DIGITS.find_iter(value).filter_map(|m| m.as_str().parse::<f64>().ok());
    let feet = numbers.next().unwrap_or(0.0);
    let inches = numbers.next().unwrap_or(0.0);

    ((feet * FOOT_IN_CM + inches * INCH_IN_CM).round() as i64).to_string()
}

fn lb_to_kg(value: String) -> String {
    match value.trim().parse::<f64>() {
        Ok(lb) => ((lb * LB_IN_KG).round() as i64).to_string(),
        Err(_) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Backend, QueryContext};
    use crate::fetch::{FetchConfig, StaticFetcher};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn apply(step: &PostProcessStep, values: &[&str]) -> Vec<String> {
        let fetcher = StaticFetcher::new();
        let config = FetchConfig::default();
        let q = Backend::Json.wrap("{}", "https://example.com/", QueryContext::new(&fetcher, &config)).unwrap();
        step.apply(strings(values), q.as_ref(), &CommonSelectors::new())
    }

    #[test]
    fn test_replace_rewrites_and_drops_unmatched() {
        let step = PostProcessStep::Replace(vec![RegexReplace::new(r"^Runtime: (\d+) min$", "$1")]);
        assert_eq!(apply(&step, &["Runtime: 42 min", "unknown"]), vec!["42"]);
    }

    #[test]
    fn test_replace_rules_apply_in_order() {
        let step = PostProcessStep::Replace(vec![RegexReplace::new(r"\s+", "-"), RegexReplace::new("-+$", "")]);
        assert_eq!(apply(&step, &["a  b "]), vec!["a-b"]);
    }

    #[test]
    fn test_replace_skips_invalid_regex() {
        let step = PostProcessStep::Replace(vec![RegexReplace::new("(unclosed", ""), RegexReplace::new("a", "b")]);
        assert_eq!(apply(&step, &["aa"]), vec!["bb"]);
    }

    #[test]
    fn test_append() {
        let step = PostProcessStep::Append("?size=full".to_string());
        assert_eq!(apply(&step, &["/img/1"]), vec!["/img/1?size=full"]);
    }

    #[test]
    fn test_parse_date() {
        let step = PostProcessStep::ParseDate("%B %d, %Y".to_string());
        assert_eq!(apply(&step, &["January 02, 2006", "garbage"]), vec!["2006-01-02", "garbage"]);
    }

    #[test]
    fn test_parse_datetime_format() {
        let step = PostProcessStep::ParseDate("%Y-%m-%dT%H:%M:%S".to_string());
        assert_eq!(apply(&step, &["2021-03-04T10:11:12"]), vec!["2021-03-04"]);
    }

    #[test]
    fn test_map() {
        let step = PostProcessStep::Map(HashMap::from([("F".to_string(), "Female".to_string())]));
        assert_eq!(apply(&step, &["F", "M"]), vec!["Female", "M"]);
    }

    #[test]
    fn test_feet_to_cm() {
        let step = PostProcessStep::FeetToCm(true);
        assert_eq!(apply(&step, &["5'10\"", "6'"]), vec!["178", "183"]);
        assert_eq!(apply(&PostProcessStep::FeetToCm(false), &["5'10\""]), vec!["5'10\""]);
    }

    #[test]
    fn test_lb_to_kg() {
        let step = PostProcessStep::LbToKg(true);
        assert_eq!(apply(&step, &["120", "n/a"]), vec!["54", "n/a"]);
    }

    #[test]
    fn test_sub_scraper_step() {
        let fetcher =
            StaticFetcher::new().with_document("https://example.com/studio/3", r#"{"studio": {"name": "Acme"}}"#);
        let config = FetchConfig::default();
        let q = Backend::Json
            .wrap("{}", "https://example.com/scene/1", QueryContext::new(&fetcher, &config))
            .unwrap();
        let step = PostProcessStep::SubScraper(Box::new(MappedAttribute::selector("studio.name")));

        let values = step.apply(strings(&["/studio/3", "/studio/404"]), q.as_ref(), &CommonSelectors::new());

        assert_eq!(values, vec!["Acme"]);
        assert_eq!(fetcher.requests(), vec!["https://example.com/studio/3", "https://example.com/studio/404"]);
    }

    #[test]
    fn test_deserialize_steps() {
        let steps: Vec<PostProcessStep> = serde_json::from_str(
            r#"[
                {"replace": [{"regex": "a", "with": "b"}]},
                {"append": "!"},
                {"sub_scraper": "name"},
                {"parse_date": "%Y"},
                {"feet_to_cm": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(steps.len(), 5);
        assert_eq!(steps[2], PostProcessStep::SubScraper(Box::new(MappedAttribute::selector("name"))));
    }
}
