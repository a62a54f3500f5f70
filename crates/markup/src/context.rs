use crate::locale::Locale;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Values the transform would otherwise read from the clock or the host
/// environment. Computed once by the caller and shipped with the job.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformContext {
    pub current_date: String,
    pub current_day: u32,
    pub current_month: u32,
    pub current_month_str: String,
    pub current_year: i32,
    pub quest_format_date: String,
    /// Resolved `{$u:name}` values keyed by `name`.
    pub user_vars: BTreeMap<String, String>,
}

impl TransformContext {
    pub fn for_date(date: NaiveDate, locale: &Locale) -> Self {
        Self {
            current_date: date.format("%Y-%m-%d").to_string(),
            current_day: date.day(),
            current_month: date.month(),
            current_month_str: locale.month_name(date.month()).unwrap_or_default().to_string(),
            current_year: date.year(),
            quest_format_date: format!("{}-{}-{}", date.year(), date.month(), date.day()),
            user_vars: BTreeMap::new(),
        }
    }

    pub fn with_user_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_vars.insert(name.into(), value.into());
        self
    }

    /// Value of a `{#field}` date token, if `field` names one.
    pub fn date_field(&self, field: &str) -> Option<String> {
        match field {
            "current_date" => Some(self.current_date.clone()),
            "current_day" => Some(self.current_day.to_string()),
            "current_month" => Some(self.current_month.to_string()),
            "current_month_str" => Some(self.current_month_str.clone()),
            "current_year" => Some(self.current_year.to_string()),
            "quest_format_date" => Some(self.quest_format_date.clone()),
            _ => None,
        }
    }
}

fn user_var_pattern() -> Result<&'static Regex, regex::Error> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{\$u:(\w+)\}"))
        .as_ref()
        .map_err(Clone::clone)
}

/// Names of the `{$u:name}` tokens in `content`, first occurrence order, deduplicated.
pub fn user_variables(content: &str) -> Vec<String> {
    let Ok(pattern) = user_var_pattern() else {
        return Vec::new();
    };
    let mut names: Vec<String> = Vec::new();
    for caps in pattern.captures_iter(content) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

pub(crate) fn substitute_user_vars(
    content: &str,
    ctx: &TransformContext,
) -> Result<String, regex::Error> {
    let pattern = user_var_pattern()?;
    Ok(pattern
        .replace_all(content, |caps: &regex::Captures<'_>| {
            ctx.user_vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned())
}
